use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Focus};
use crate::input::InputMode;
use crate::views::{CardView, ListView};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub fn draw(f: &mut Frame, app: &App) {
    let banner_height = if app.page.notice().is_some() { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(banner_height),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    // Top bar
    let help = match app.input_mode() {
        InputMode::Browse => {
            "newsdesk — j/k:move  n:new  e:edit  d:delete  o:open image  r:reload  x:dismiss  q:quit"
        }
        InputMode::Form => "Tab:next field  Enter:pick images  Del:remove image  Ctrl+S:save  Esc:cancel",
        InputMode::Confirm => "y:delete  n/Esc:keep",
    };
    f.render_widget(Paragraph::new(help), chunks[0]);

    if let Some(notice) = app.page.notice() {
        let banner = Paragraph::new(format!("⚠ {notice}  (x to dismiss)"))
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        f.render_widget(banner, chunks[1]);
    }

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[2]);

    draw_form(f, app, panes[0]);
    draw_list(f, app, panes[1]);

    // Bottom status
    f.render_widget(Paragraph::new(app.page.status().to_string()), chunks[3]);

    if let Some(article) = app.page.pending_delete() {
        let area = centered(f.area(), 50, 5);
        let prompt = Paragraph::new(vec![
            Line::from("Are you sure you want to delete this news item?"),
            Line::from(Span::styled(
                article.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from("y / n"),
        ])
        .block(Block::default().borders(Borders::ALL).title("Delete"))
        .wrap(Wrap { trim: true });
        f.render_widget(Clear, area);
        f.render_widget(prompt, area);
    }
}

fn draw_form(f: &mut Frame, app: &App, area: Rect) {
    let form = &app.form;
    let title = match (form.editing().is_some(), form.is_busy()) {
        (_, true) => "Submitting...",
        (true, false) => "Edit News",
        (false, false) => "Add New News",
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Min(3),
        ])
        .split(area);

    let field_block = |label: &'static str, focus: Focus| {
        let block = Block::default().borders(Borders::ALL).title(label);
        if app.focus == focus {
            block.border_style(Style::default().fg(Color::Cyan))
        } else {
            block
        }
    };

    f.render_widget(
        Paragraph::new(form.title()).block(field_block("News Title *", Focus::Title)),
        rows[0],
    );
    f.render_widget(
        Paragraph::new(form.description())
            .wrap(Wrap { trim: false })
            .block(field_block("News Description *", Focus::Description)),
        rows[1],
    );
    f.render_widget(
        Paragraph::new(app.picker.as_str()).block(field_block("Images (comma-separated paths)", Focus::Images)),
        rows[2],
    );

    let previews: Vec<ListItem> = if form.previews_pending() {
        vec![ListItem::new("Reading images…")]
    } else {
        form.images()
            .iter()
            .enumerate()
            .map(|(i, image)| {
                let marker = if app.focus == Focus::Images && i == app.image_cursor { "▶ " } else { "  " };
                let label = match &image.file {
                    Some(file) => format!("{} ({} chars preview)", file.name(), image.preview.len()),
                    None => image.preview.clone(),
                };
                ListItem::new(format!("{marker}{}. {label}", i + 1))
            })
            .collect()
    };
    let list = List::new(previews).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("{title} — Image Previews")),
    );
    f.render_widget(list, rows[3]);
}

fn draw_list(f: &mut Frame, app: &App, area: Rect) {
    let view = ListView::new(app.page.articles(), app.page.is_loading(), &app.broken_images);
    let block = Block::default().borders(Borders::ALL).title(view.heading());

    match view {
        ListView::Loading => {
            let spinner = SPINNER[app.tick / 4 % SPINNER.len()];
            f.render_widget(Paragraph::new(format!("{spinner} Loading news…")).block(block), area);
        }
        ListView::Empty => {
            let text = Text::from(vec![
                Line::from(Span::styled(
                    "No News Available",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from("Start by adding your first news article using the form."),
            ]);
            f.render_widget(Paragraph::new(text).block(block), area);
        }
        ListView::Populated(cards) => {
            let items: Vec<ListItem> = cards.iter().map(card_item).collect();
            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
                .highlight_symbol("▶ ");
            let mut state = ListState::default().with_selected(Some(app.selected));
            f.render_stateful_widget(list, area, &mut state);
        }
    }
}

fn card_item<'a>(card: &CardView<'a>) -> ListItem<'a> {
    let mut image = format!("image: {}", card.image);
    if card.extra_images() > 0 {
        image.push_str(&format!(" (+{} more)", card.extra_images()));
    }
    ListItem::new(Text::from(vec![
        Line::from(vec![
            Span::styled(card.article.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("  {}", card.article.date_line())),
        ]),
        Line::from(image).style(Style::default().fg(Color::DarkGray)),
        Line::from(card.summary.to_string()),
        Line::from(""),
    ]))
}

fn centered(area: Rect, width_percent: u16, height: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(width_percent) / 100) as u16;
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height: height.min(area.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sample_articles;
    use crate::page::{Completion, Synced};
    use ratatui::{backend::TestBackend, Terminal};

    fn rendered(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn shows_loading_then_cards() {
        let mut app = App::new();
        assert!(rendered(&app).contains("Loading news"));

        app.page
            .apply(Completion::Loaded(Synced::Remote(sample_articles())));
        let screen = rendered(&app);
        assert!(screen.contains("All News (2)"));
        assert!(screen.contains("New Product Launch"));
    }

    #[test]
    fn shows_empty_state_and_delete_prompt() {
        let mut app = App::new();
        app.page.apply(Completion::Loaded(Synced::Remote(vec![])));
        assert!(rendered(&app).contains("No News Available"));

        app.page
            .apply(Completion::Loaded(Synced::Remote(sample_articles())));
        let id = app.page.articles()[0].id.clone();
        app.page.request_delete(&id);
        assert!(rendered(&app).contains("Are you sure"));
    }
}
