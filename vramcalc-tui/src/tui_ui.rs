use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};

use crate::tui_app::{App, Field};
use vramcalc_core::{ComplexityTier, DeploymentMode, UtilizationClass};

pub fn draw(frame: &mut Frame, app: &App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // summary bar
            Constraint::Min(12),   // form + results
            Constraint::Length(1), // status bar
        ])
        .split(frame.area());

    draw_summary_bar(frame, app, outer[0]);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(outer[1]);

    draw_form(frame, app, main[0]);
    draw_results(frame, app, main[1]);
    draw_status_bar(frame, outer[2]);
}

fn utilization_color(class: UtilizationClass) -> Color {
    match class {
        UtilizationClass::Low => Color::Green,
        UtilizationClass::Medium => Color::Yellow,
        UtilizationClass::High => Color::Magenta,
        UtilizationClass::Extreme => Color::Red,
    }
}

fn tier_color(tier: ComplexityTier) -> Color {
    match tier {
        ComplexityTier::Tiny => Color::Cyan,
        ComplexityTier::Small => Color::Green,
        ComplexityTier::Medium => Color::Blue,
        ComplexityTier::Large => Color::Yellow,
        ComplexityTier::XLarge => Color::Magenta,
        ComplexityTier::Massive => Color::Red,
    }
}

fn draw_summary_bar(frame: &mut Frame, app: &App, area: Rect) {
    let c = &app.config;
    let memory = match c.deployment_mode {
        DeploymentMode::DiscreteGpu => format!("{} GB GPU, {} GB RAM", c.gpu_memory_gb, c.system_memory_gb),
        DeploymentMode::UnifiedMemory => format!("{} GB unified", c.system_memory_gb),
    };
    let kv = if c.use_kv_cache {
        format!("KV {}", c.kv_cache_quantization)
    } else {
        "KV off".to_string()
    };

    let text = Line::from(vec![
        Span::styled(" Model: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{}B {}", c.params_billions, c.model_quantization),
            Style::default().fg(Color::White),
        ),
        Span::styled("  │  ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{} ctx, {}", c.context_length, kv),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled("  │  ", Style::default().fg(Color::DarkGray)),
        Span::styled(memory, Style::default().fg(Color::Yellow)),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" vramcalc ")
        .title_style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_form(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    for (i, field) in Field::ALL.iter().enumerate() {
        // Section breaks mirror the model / system split of the form
        if i == 0 {
            lines.push(section_header("Model"));
        } else if *field == Field::Mode {
            lines.push(Line::from(""));
            lines.push(section_header("System"));
        }

        let active = field.is_active(&app.config);
        let selected = *field == app.selected;
        let marker = if selected { "▶ " } else { "  " };

        let (label_style, value_style) = if !active {
            (
                Style::default().fg(Color::DarkGray),
                Style::default().fg(Color::DarkGray),
            )
        } else if selected {
            (
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            (
                Style::default().fg(Color::White),
                Style::default().fg(Color::Cyan),
            )
        };

        let value = if selected {
            format!(" ◀ {} ▶ ", field.value_text(&app.config))
        } else {
            format!("   {}   ", field.value_text(&app.config))
        };

        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Yellow)),
            Span::styled(format!("{:<24}", field.label()), label_style),
            Span::styled(value, value_style),
        ]));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Configuration ")
        .title_style(Style::default().fg(Color::White).bold());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn section_header(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!(" {}", title),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    ))
}

fn draw_results(frame: &mut Frame, app: &App, area: Rect) {
    let report = &app.report;
    let rec = &report.recommendation;
    let accent = tier_color(report.complexity_tier);
    let util_color = utilization_color(report.utilization_class);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
        .title(format!(
            " Hardware Requirements · {} ",
            report.complexity_tier.label()
        ))
        .title_style(Style::default().fg(accent).bold());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // VRAM needed
            Constraint::Length(1), // gauge
            Constraint::Length(1), // spacer
            Constraint::Min(4),    // details
        ])
        .split(inner);

    let vram_line = Line::from(vec![
        Span::styled(" VRAM Needed  ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{:.1} GB", rec.vram_needed_gb),
            Style::default().fg(Color::White).bold(),
        ),
        Span::styled(
            format!("  of {:.1} GB", report.available_memory_gb),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(vram_line), rows[0]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(util_color).bg(Color::Black))
        .ratio(report.utilization_ratio())
        .label(format!(
            "{:.1}% Utilization ({})",
            report.utilization_pct,
            report.utilization_class.label()
        ));
    frame.render_widget(gauge, rows[1]);

    let mut lines = vec![
        detail_line(
            "On-disk Size",
            format!("{:.1} GB", report.on_disk_size_gb),
            Color::White,
        ),
        detail_line("GPU Configuration", report.gpu_configuration(), Color::Yellow),
        detail_line(
            "System Memory",
            format!("{:.1} GB Required", rec.system_ram_needed_gb),
            Color::Cyan,
        ),
    ];

    if app.config.is_unified() {
        let (text, color) = if rec.fits_unified_memory {
            ("Model fits in unified memory", Color::Green)
        } else {
            ("Model exceeds unified memory capacity", Color::Red)
        };
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", text),
            Style::default().fg(color).bold(),
        )));
    }

    if !report.notes.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            " Notes",
            Style::default().fg(Color::Cyan).bold(),
        )));
        for note in &report.notes {
            lines.push(Line::from(Span::styled(
                format!("  {}", note),
                Style::default().fg(Color::White),
            )));
        }
    }

    let details = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(details, rows[3]);
}

fn detail_line(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!(" {:<20}", label),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(value, Style::default().fg(color)),
    ])
}

fn draw_status_bar(frame: &mut Frame, area: Rect) {
    let keys = " ↑↓/jk:field  ←→/hl:adjust  PgUp/PgDn:x10  Space:toggle  r:reset  q:quit";
    let status_line = Line::from(vec![
        Span::styled(
            " CALC ",
            Style::default().fg(Color::Black).bg(Color::Green).bold(),
        ),
        Span::styled(keys, Style::default().fg(Color::DarkGray)),
    ]);

    frame.render_widget(Paragraph::new(status_line), area);
}
