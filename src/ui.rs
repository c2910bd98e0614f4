use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
};
use unicode_width::UnicodeWidthChar;
use crate::app::App;
use crate::chat::{Role, SUGGESTIONS};

/// Below this width the sidebar is dropped, like the page's `md:` breakpoint.
const SIDEBAR_MIN_WIDTH: u16 = 100;
const SIDEBAR_WIDTH: u16 = 28;

const ACCENT: Color = Color::Green;
const BOT_ACCENT: Color = Color::LightBlue;

/// Convert `**bold**` spans to styled text. An unclosed `**` is kept literally.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let parts: Vec<&str> = text.split("**").collect();
    let last = parts.len() - 1;
    // An even number of parts means the final `**` never closed
    let unclosed = parts.len() % 2 == 0;

    let mut spans: Vec<Span<'static>> = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let inside_bold = i % 2 == 1;
        if inside_bold && unclosed && i == last {
            spans.push(Span::raw(format!("**{}", part)));
        } else if inside_bold {
            if !part.is_empty() {
                spans.push(Span::styled(
                    part.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            }
        } else if !part.is_empty() {
            spans.push(Span::raw(part.to_string()));
        }
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let main_area = if body_area.width >= SIDEBAR_MIN_WIDTH {
        let [sidebar_area, main_area] = Layout::horizontal([
            Constraint::Length(SIDEBAR_WIDTH),
            Constraint::Min(0),
        ])
        .areas(body_area);
        render_sidebar(frame, sidebar_area);
        main_area
    } else {
        body_area
    };

    let [messages_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(main_area);

    if app.chat.shows_suggestions() {
        render_empty_state(app, frame, messages_area);
    } else {
        app.suggestions_area = None;
        render_messages(app, frame, messages_area);
    }

    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" ⚡ RevTalk Assistant ", Style::default().fg(ACCENT).bold()),
        Span::styled("EV Chargers Expert", Style::default().fg(Color::Gray)),
        Span::raw("  "),
        Span::styled(app.endpoint.clone(), Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

/// Static decoration; none of it reacts to input.
fn render_sidebar(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(Style::default().fg(Color::DarkGray));

    let lines = vec![
        Line::from(Span::styled(" ⚡ RevTalk AI", Style::default().fg(Color::White).bold())),
        Line::from(Span::styled("    Online", Style::default().fg(ACCENT))),
        Line::default(),
        Line::from(Span::styled(" [ + New Chat ]", Style::default().fg(BOT_ACCENT))),
        Line::default(),
        Line::from(Span::styled(" TODAY", Style::default().fg(Color::DarkGray))),
        Line::from(Span::styled(" EV Battery Comparison", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(" Charging Speed Guide", Style::default().fg(Color::Gray))),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_empty_state(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    app.chat_area = Some(area);
    app.chat_height = inner.height;
    app.chat_width = inner.width;

    let list_height = SUGGESTIONS.len() as u16 + 2;
    let [_, welcome_area, list_row, _] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(5),
        Constraint::Length(list_height),
        Constraint::Min(0),
    ])
    .areas(inner);

    let welcome = Paragraph::new(vec![
        Line::from(Span::styled("🔋", Style::default().fg(ACCENT))),
        Line::default(),
        Line::from(Span::styled(
            "How can I help you today?",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Ask anything about EV batteries, charging systems, performance or cost.",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    frame.render_widget(welcome, welcome_area);

    let list_width = 48u16.min(list_row.width);
    let [_, list_area, _] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(list_width),
        Constraint::Min(0),
    ])
    .areas(list_row);
    app.suggestions_area = Some(list_area);

    let items: Vec<ListItem> = SUGGESTIONS
        .iter()
        .map(|q| ListItem::new(format!(" {} ", q)))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Try asking (↑/↓, Tab) "),
        )
        .highlight_style(
            Style::default()
                .bg(ACCENT)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, list_area, &mut app.suggestion_state);
}

fn render_messages(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);
    // Inner size minus borders, used for wrapping and scroll calculations
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let mut lines: Vec<Line> = Vec::new();

    for msg in app.chat.messages() {
        match msg.role() {
            Role::User => {
                lines.push(
                    Line::from(Span::styled(
                        "You:",
                        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
                    ))
                    .alignment(Alignment::Right),
                );
                for line in msg.text().lines() {
                    lines.push(
                        Line::from(Span::styled(line.to_string(), Style::default().fg(Color::White)))
                            .alignment(Alignment::Right),
                    );
                }
            }
            Role::Bot => {
                lines.push(Line::from(Span::styled(
                    "RevTalk:",
                    Style::default().fg(BOT_ACCENT).add_modifier(Modifier::BOLD),
                )));
                for line in msg.text().lines() {
                    lines.push(parse_markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.chat.is_pending() {
        lines.push(Line::from(Span::styled(
            "RevTalk:",
            Style::default().fg(BOT_ACCENT).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    // Measure the wrapped height before the block is attached so borders don't count
    let chat = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
    let wrapped = chat.line_count(app.chat_width).min(u16::MAX as usize) as u16;
    app.set_chat_lines(wrapped);

    let chat = chat.block(block).scroll((app.scroll, 0));

    frame.render_widget(chat, area);

    let max_scroll = app.max_scroll();
    if max_scroll > 0 {
        let mut scrollbar_state = ScrollbarState::new(max_scroll as usize)
            .position(app.scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    // While a reply is pending the send affordance is disabled; show it dimmed
    let (border_color, title) = if app.chat.is_pending() {
        (Color::DarkGray, " Message (waiting for reply) ")
    } else {
        (ACCENT, " Message (Enter to send) ")
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = visible_input(app.chat.draft(), app.cursor, inner_width);

    let input = if app.chat.draft().is_empty() {
        Paragraph::new(Span::styled(
            "Ask about EV batteries...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Paragraph::new(visible_text).style(Style::default().fg(Color::White))
    };

    frame.render_widget(input.block(input_block), area);
    frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
}

/// Slice of the draft that fits in `width` terminal columns with the cursor
/// (a char index) kept in view, plus the cursor's column within that slice.
/// Measured in display width so wide glyphs take two cells.
fn visible_input(text: &str, cursor: usize, width: usize) -> (String, u16) {
    let chars: Vec<char> = text.chars().collect();
    let cursor = cursor.min(chars.len());
    let char_width = |c: &char| c.width().unwrap_or(0);

    // Drop leading chars until the text before the cursor plus the cursor cell fits
    let mut start = 0;
    let mut before: usize = chars[..cursor].iter().map(char_width).sum();
    while start < cursor && before + 1 > width {
        before -= char_width(&chars[start]);
        start += 1;
    }

    let mut used = 0;
    let visible: String = chars[start..]
        .iter()
        .take_while(|c| {
            used += char_width(*c);
            used <= width
        })
        .collect();

    (visible, before.min(u16::MAX as usize) as u16)
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = if app.chat.is_pending() {
        (" SENDING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" CHAT ", Style::default().bg(ACCENT).fg(Color::Black))
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
    ];
    if app.chat.shows_suggestions() {
        hints.extend(vec![
            Span::styled(" ↑/↓ ", key_style),
            Span::styled(" suggestion ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" use ", label_style),
        ]);
    } else {
        hints.extend(vec![
            Span::styled(" PgUp/PgDn ", key_style),
            Span::styled(" scroll ", label_style),
        ]);
    }
    hints.extend(vec![
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
