use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use crate::app::{App, FocusField, InputMode, SettingsField};
use crate::lifecycle::RequestState;
use crate::reply::ReplyCategory;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, persona bar, inputs, results, footer
    let [header_area, persona_area, message_area, intent_area, body_area, footer_area] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);

    render_header(frame, header_area);
    render_persona_bar(app, frame, persona_area);
    render_message_input(app, frame, message_area);
    render_intent_input(app, frame, intent_area);
    render_results(app, frame, body_area);
    render_footer(app, frame, footer_area);

    if app.show_settings {
        render_settings_popup(app, frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Chat Copilot ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("高情商回复助手 ", Style::default().fg(Color::White)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_persona_bar(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" 当前人设 ")
        .title_style(Style::default().fg(Color::Cyan));

    let line = Line::from(vec![
        Span::styled("我: ", Style::default().fg(Color::Green).bold()),
        Span::raw(app.persona.self_persona.clone()),
        Span::styled("  →  ", Style::default().fg(Color::DarkGray)),
        Span::styled("对方: ", Style::default().fg(Color::Blue).bold()),
        Span::raw(app.persona.counterpart_persona.clone()),
        Span::styled("  |  ", Style::default().fg(Color::DarkGray)),
        Span::styled("关系: ", Style::default().fg(Color::Red).bold()),
        Span::raw(app.persona.relationship.clone()),
    ]);

    let bar = Paragraph::new(line).block(block);
    frame.render_widget(bar, area);
}

fn input_border_style(app: &App, field: FocusField) -> Style {
    if app.input_mode == InputMode::Editing && app.focus == field && !app.show_settings {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn render_message_input(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(input_border_style(app, FocusField::Message))
        .title(" 对方发来的消息 ");

    let text = if app.message_input.is_empty() && app.focus != FocusField::Message {
        Paragraph::new("粘贴对方的消息...").style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(app.message_input.as_str())
    };

    frame.render_widget(text.block(block).wrap(Wrap { trim: false }), area);

    if app.input_mode == InputMode::Editing
        && app.focus == FocusField::Message
        && !app.show_settings
    {
        set_input_cursor(frame, area, app.message_cursor);
    }
}

fn render_intent_input(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(input_border_style(app, FocusField::Intent))
        .title(" 我的小心思 (可选) ");

    let text = if app.intent_input.is_empty() && app.focus != FocusField::Intent {
        Paragraph::new("例如：我想拖延一下 / 想要委婉拒绝...")
            .style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(app.intent_input.as_str())
    };

    frame.render_widget(text.block(block), area);

    if app.input_mode == InputMode::Editing && app.focus == FocusField::Intent && !app.show_settings
    {
        set_input_cursor(frame, area, app.intent_cursor);
    }
}

/// Place the terminal cursor inside a bordered single-line input. Wrapped
/// lines put the cursor on the row the character lands on.
fn set_input_cursor(frame: &mut Frame, area: Rect, cursor: usize) {
    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let cursor_y = (cursor / inner_width) as u16;
    let cursor_x = (cursor % inner_width) as u16;
    let max_y = area.height.saturating_sub(2).saturating_sub(1);
    frame.set_cursor_position((area.x + 1 + cursor_x, area.y + 1 + cursor_y.min(max_y)));
}

fn category_style(category: ReplyCategory) -> Style {
    match category {
        ReplyCategory::Standard => Style::default().fg(Color::Green).bold(),
        ReplyCategory::Intense => Style::default().fg(Color::Magenta).bold(),
        ReplyCategory::Short => Style::default().fg(Color::Blue).bold(),
    }
}

fn render_results(app: &mut App, frame: &mut Frame, area: Rect) {
    match app.lifecycle.state() {
        RequestState::Loading => {
            let dots = ".".repeat(app.animation_frame as usize + 1);
            let loading = Paragraph::new(format!("正在思考高情商回复{}", dots))
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().borders(Borders::ALL).border_style(
                    Style::default().fg(Color::Yellow),
                ));
            frame.render_widget(loading, area);
        }
        RequestState::Error(message) => {
            let banner = Paragraph::new(format!("⚠ {}", message))
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Red)),
                );
            frame.render_widget(banner, area);
        }
        RequestState::Success(options) if !options.is_empty() => {
            let items: Vec<ListItem> = options
                .iter()
                .enumerate()
                .map(|(i, option)| {
                    let mut lines = vec![Line::from(vec![
                        Span::styled(
                            format!("[{}] ", option.category.display_name()),
                            category_style(option.category),
                        ),
                        Span::styled(
                            option.label.clone(),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                    ])];
                    lines.push(Line::from(option.content.clone()));
                    if let Some(explanation) = &option.explanation {
                        lines.push(Line::from(Span::styled(
                            format!("OS: {}", explanation),
                            Style::default().fg(Color::DarkGray),
                        )));
                    }
                    if app.copied_index == Some(i) {
                        lines.push(Line::from(Span::styled(
                            "✓ 已复制",
                            Style::default().fg(Color::Green),
                        )));
                    }
                    lines.push(Line::default());
                    ListItem::new(lines)
                })
                .collect();

            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" 回复选项 ")
                .title_bottom(Line::from(" AI 生成内容，发送前请自行调整 ").right_aligned());

            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
                .highlight_symbol("> ");

            frame.render_stateful_widget(list, area, &mut app.options_state);
        }
        _ => {
            // Idle, or Success with zero options (valid soft-empty result)
            let hint = match app.lifecycle.state() {
                RequestState::Success(_) => "没有生成任何选项，换个说法再试试",
                _ => "输入消息后按 Enter 生成回复",
            };
            let idle = Paragraph::new(hint)
                .style(Style::default().fg(Color::DarkGray))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::DarkGray)),
                );
            frame.render_widget(idle, area);
        }
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints: Vec<Span> = if app.show_settings {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" 保存 ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" 下一项 ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" 取消 ", label_style),
        ]
    } else {
        match app.input_mode {
            InputMode::Editing => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" 生成 ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" 切换输入 ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" 浏览结果 ", label_style),
            ],
            InputMode::Normal => vec![
                Span::styled(" j/k ", key_style),
                Span::styled(" 选择 ", label_style),
                Span::styled(" c ", key_style),
                Span::styled(" 复制 ", label_style),
                Span::styled(" s ", key_style),
                Span::styled(" 人设 ", label_style),
                Span::styled(" e ", key_style),
                Span::styled(" 编辑 ", label_style),
                Span::styled(" r ", key_style),
                Span::styled(" 重置 ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" 退出 ", label_style),
            ],
        }
    };

    let footer = Paragraph::new(Line::from(hints));
    frame.render_widget(footer, area);
}

fn render_settings_popup(app: &App, frame: &mut Frame, area: Rect) {
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 9.min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" 设定人设 ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let fields = [
        SettingsField::SelfPersona,
        SettingsField::CounterpartPersona,
        SettingsField::Relationship,
    ];
    let values = [
        &app.settings_draft.self_persona,
        &app.settings_draft.counterpart_persona,
        &app.settings_draft.relationship,
    ];

    for (row, (field, value)) in fields.iter().zip(values.iter()).enumerate() {
        let y = inner.y + (row as u16) * 2;
        if y >= inner.y + inner.height {
            break;
        }
        let active = *field == app.settings_field;
        let style = if active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let line = Line::from(vec![
            Span::styled(format!("{}: ", field.label()), style.bold()),
            Span::styled(value.to_string(), style),
        ]);
        let field_area = Rect::new(inner.x, y, inner.width, 1);
        frame.render_widget(Paragraph::new(line), field_area);

        if active {
            // Label is CJK (double width) plus ": "
            let label_width = field.label().chars().count() as u16 * 2 + 2;
            let cursor_x = label_width + app.settings_cursor.min(inner.width as usize) as u16;
            frame.set_cursor_position((inner.x + cursor_x.min(inner.width), y));
        }
    }

    let hint = Paragraph::new("Enter 保存 · Tab 下一项 · Esc 取消")
        .style(Style::default().fg(Color::DarkGray));
    let hint_area = Rect::new(inner.x, inner.y + inner.height.saturating_sub(1), inner.width, 1);
    frame.render_widget(hint, hint_area);
}
