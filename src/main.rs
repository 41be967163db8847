use eframe::egui;
use egui::{Color32, CornerRadius, RichText, ScrollArea, Stroke, Ui, ViewportBuilder};
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod db;
mod error;
mod feed;
mod history;
mod hn_client;
mod models;

use crate::db::HiddenStore;
use crate::error::HnError;
use crate::feed::FeedSession;
use crate::history::{NavHistory, Route};
use crate::hn_client::HnClient;
use crate::models::{first_level_children, format_time_ago, Category, Comment, Story};

/// How long a hidden story card fades out before it is removed.
const HIDE_FADE_SECS: f32 = 0.25;

/// How often to poll for fetch results when no animation drives frames.
const FETCH_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Whether background fetches are outstanding and frames must keep coming,
/// so their results are drained promptly instead of waiting for the next
/// input event.
fn has_pending_fetches(in_flight: usize, loading_ids: bool, detail_loading: bool) -> bool {
    in_flight > 0 || loading_ids || detail_loading
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([1000.0, 760.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("HN Reader"),
        ..Default::default()
    };

    eframe::run_native(
        "HN Reader",
        options,
        Box::new(|cc| {
            let mut app = HnReaderApp::new()?;

            // Restore the saved theme preference
            if let Some(storage) = cc.storage {
                if let Some(theme_str) = storage.get_string("is_dark_mode") {
                    if let Ok(is_dark_mode) = theme_str.parse::<bool>() {
                        app.is_dark_mode = is_dark_mode;
                        app.theme = if is_dark_mode {
                            AppTheme::dark()
                        } else {
                            AppTheme::light()
                        };
                    }
                }
            }

            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {e}"))
}

struct AppTheme {
    background: Color32,
    card_background: Color32,
    text: Color32,
    secondary_text: Color32,
    highlight: Color32,
    separator: Color32,
    score_high: Color32,
    score_medium: Color32,
    score_low: Color32,
    button_background: Color32,
    button_foreground: Color32,
    button_active_background: Color32,
    button_hover_background: Color32,
}

impl AppTheme {
    fn dark() -> Self {
        Self {
            background: Color32::from_rgb(18, 18, 18),
            card_background: Color32::from_rgb(30, 30, 30),
            text: Color32::from_rgb(240, 240, 240),
            secondary_text: Color32::from_rgb(180, 180, 180),
            highlight: Color32::from_rgb(255, 102, 0), // HN orange
            separator: Color32::from_rgb(60, 60, 60),
            score_high: Color32::from_rgb(76, 175, 80),
            score_medium: Color32::from_rgb(255, 193, 7),
            score_low: Color32::from_rgb(158, 158, 158),
            button_background: Color32::from_rgb(66, 66, 66),
            button_foreground: Color32::from_rgb(240, 240, 240),
            button_active_background: Color32::from_rgb(255, 102, 0),
            button_hover_background: Color32::from_rgb(80, 80, 80),
        }
    }

    fn light() -> Self {
        Self {
            background: Color32::from_rgb(245, 245, 245),
            card_background: Color32::from_rgb(255, 255, 255),
            text: Color32::from_rgb(20, 20, 20),
            secondary_text: Color32::from_rgb(90, 90, 90),
            highlight: Color32::from_rgb(235, 92, 0),
            separator: Color32::from_rgb(200, 200, 200),
            score_high: Color32::from_rgb(30, 110, 40),
            score_medium: Color32::from_rgb(190, 130, 0),
            score_low: Color32::from_rgb(80, 80, 80),
            button_background: Color32::from_rgb(235, 235, 235),
            button_foreground: Color32::from_rgb(20, 20, 20),
            button_active_background: Color32::from_rgb(235, 92, 0),
            button_hover_background: Color32::from_rgb(210, 210, 210),
        }
    }

    fn apply_to_ctx(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();

        style.visuals.panel_fill = self.background;
        style.visuals.window_fill = self.card_background;
        style.visuals.window_stroke = Stroke::new(1.0, self.separator);
        style.visuals.widgets.noninteractive.bg_fill = self.card_background;
        style.visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text);

        style.visuals.widgets.inactive.bg_fill = self.button_background;
        style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.active.bg_fill = self.button_active_background;
        style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.hovered.bg_fill = self.button_hover_background;
        style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.button_foreground);

        style.visuals.selection.bg_fill = self.highlight;
        style.visuals.selection.stroke = Stroke::new(1.0, self.highlight);

        style.visuals.window_corner_radius = CornerRadius::same(8);
        style.visuals.widgets.noninteractive.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.inactive.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.hovered.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.active.corner_radius = CornerRadius::same(4);

        ctx.set_style(style);
    }

    fn score_color(&self, score: i64) -> Color32 {
        if score >= 300 {
            self.score_high
        } else if score >= 100 {
            self.score_medium
        } else {
            self.score_low
        }
    }
}

/// Results arriving from background fetch threads. Every event carries the
/// epoch it was dispatched under; events from superseded activations are
/// dropped at the drain loop.
enum FetchEvent {
    Ids {
        epoch: u64,
        result: Result<Vec<u64>, HnError>,
    },
    Story {
        epoch: u64,
        id: u64,
        result: Result<Story, HnError>,
    },
    Detail {
        epoch: u64,
        result: Result<Story, HnError>,
    },
    Comment {
        epoch: u64,
        comment: Comment,
    },
    DetailDone {
        epoch: u64,
    },
}

/// State of the story detail view while it is active.
struct DetailView {
    story: Option<Story>,
    comments: Vec<Comment>,
    loading: bool,
}

impl DetailView {
    fn new() -> Self {
        Self {
            story: None,
            comments: Vec::new(),
            loading: true,
        }
    }
}

struct HnReaderApp {
    client: HnClient,
    hidden: HiddenStore,
    history: NavHistory,
    // Current listing activation; superseded (not torn down) on navigation
    session: Option<FeedSession>,
    stories: Vec<Story>,
    loading_ids: bool,
    // Story fetches dispatched for the current epoch and not yet drained
    in_flight: usize,
    detail: Option<DetailView>,
    // Bumped on every route activation; stale fetch results are discarded
    epoch: u64,
    events_tx: Sender<FetchEvent>,
    events_rx: Receiver<FetchEvent>,
    theme: AppTheme,
    is_dark_mode: bool,
    // Fade-out state for cards being hidden
    hiding: Vec<(u64, Instant)>,
    // Set when a hide completes, to backfill the freed viewport space
    backfill_check: bool,
    // Pending actions to avoid borrow checker issues
    pending_route: Option<Route>,
    pending_hide: Option<u64>,
    initialized: bool,
    needs_repaint: bool,
}

impl HnReaderApp {
    fn new() -> anyhow::Result<Self> {
        let hidden = HiddenStore::open_default()?;
        let (events_tx, events_rx) = std::sync::mpsc::channel();

        Ok(Self {
            client: HnClient::new(),
            hidden,
            history: NavHistory::new(Route::Feed(Category::Top)),
            session: None,
            stories: Vec::new(),
            loading_ids: false,
            in_flight: 0,
            detail: None,
            epoch: 0,
            events_tx,
            events_rx,
            theme: AppTheme::dark(),
            is_dark_mode: true,
            hiding: Vec::new(),
            backfill_check: false,
            pending_route: None,
            pending_hide: None,
            initialized: false,
            needs_repaint: false,
        })
    }

    fn navigate(&mut self, route: Route) {
        self.history.push(route);
        self.apply_route(route);
    }

    fn go_back(&mut self) {
        if let Some(route) = self.history.back() {
            self.apply_route(route);
        }
    }

    fn go_forward(&mut self) {
        if let Some(route) = self.history.forward() {
            self.apply_route(route);
        }
    }

    /// Activate a route. The epoch bump makes every in-flight fetch from the
    /// previous activation stale; its threads run to completion and their
    /// results are dropped on arrival.
    fn apply_route(&mut self, route: Route) {
        self.epoch += 1;
        self.hiding.clear();
        self.backfill_check = false;
        // Superseded fetches are stale now; arrivals must not decrement
        self.in_flight = 0;

        match route {
            Route::Feed(category) => {
                self.detail = None;
                self.activate_category(category);
            }
            Route::Story(id) => {
                self.open_story(id);
            }
        }
        self.needs_repaint = true;
    }

    fn activate_category(&mut self, category: Category) {
        self.stories.clear();
        self.session = None;
        self.loading_ids = true;

        let client = self.client.clone();
        let tx = self.events_tx.clone();
        let epoch = self.epoch;

        debug!(category = category.label(), epoch, "activating category");
        thread::spawn(move || {
            let result = client.fetch_category_ids(category);
            let _ = tx.send(FetchEvent::Ids { epoch, result });
        });
    }

    /// Fetch the story, then its first-level comments (capped, sequential:
    /// each child fetch completes before the next is issued). Each comment
    /// is sent as it resolves so the view fills incrementally.
    fn open_story(&mut self, id: u64) {
        self.detail = Some(DetailView::new());

        let client = self.client.clone();
        let tx = self.events_tx.clone();
        let epoch = self.epoch;

        thread::spawn(move || {
            match client.fetch_item(id) {
                Ok(story) => {
                    let kids = story.kids.clone();
                    let _ = tx.send(FetchEvent::Detail {
                        epoch,
                        result: Ok(story),
                    });
                    for &kid in first_level_children(&kids) {
                        match client.fetch_comment(kid) {
                            Ok(comment) => {
                                let _ = tx.send(FetchEvent::Comment { epoch, comment });
                            }
                            Err(e) => {
                                warn!(comment_id = kid, "skipping comment: {e}");
                            }
                        }
                    }
                }
                Err(e) => {
                    let _ = tx.send(FetchEvent::Detail {
                        epoch,
                        result: Err(e),
                    });
                }
            }
            let _ = tx.send(FetchEvent::DetailDone { epoch });
        });
    }

    /// Dispatch the next batch: advance the cursor, filter out hidden ids,
    /// and spawn one fetch thread per surviving id. Completions arrive in
    /// whatever order the network produces them.
    fn dispatch_batch(&mut self) {
        let hidden = match self.hidden.snapshot() {
            Ok(ids) => ids,
            Err(e) => {
                error!("failed to read hidden set: {e}");
                Default::default()
            }
        };

        let Some(session) = self.session.as_mut() else {
            return;
        };
        let epoch = session.epoch();
        let batch = session.begin_batch(&hidden);
        debug!(
            epoch,
            cursor = session.cursor(),
            total = session.len(),
            batch_len = batch.len(),
            "dispatching batch"
        );

        self.in_flight += batch.len();
        for id in batch {
            let client = self.client.clone();
            let tx = self.events_tx.clone();
            thread::spawn(move || {
                let result = client.fetch_item(id);
                let _ = tx.send(FetchEvent::Story { epoch, id, result });
            });
        }

        if let Some(session) = self.session.as_mut() {
            session.finish_dispatch();
        }
    }

    /// Drain all pending fetch results. Runs at the top of every frame, on
    /// the UI thread, so list mutation never interleaves with rendering.
    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                FetchEvent::Ids { epoch, result } => {
                    if epoch != self.epoch {
                        debug!(epoch, "dropping stale id list");
                        continue;
                    }
                    self.loading_ids = false;
                    match result {
                        Ok(ids) => {
                            self.session = Some(FeedSession::new(epoch, ids));
                            self.dispatch_batch();
                        }
                        Err(e) => {
                            // The activation aborts; the view stays empty.
                            error!("failed to load story ids: {e}");
                        }
                    }
                    self.needs_repaint = true;
                }
                FetchEvent::Story { epoch, id, result } => {
                    if epoch != self.epoch {
                        debug!(epoch, id, "dropping stale story");
                        continue;
                    }
                    self.in_flight = self.in_flight.saturating_sub(1);
                    match result {
                        Ok(story) => self.stories.push(story),
                        Err(e) => warn!(story_id = id, "skipping story: {e}"),
                    }
                    self.needs_repaint = true;
                }
                FetchEvent::Detail { epoch, result } => {
                    if epoch != self.epoch {
                        continue;
                    }
                    match result {
                        Ok(story) => {
                            if let Some(detail) = self.detail.as_mut() {
                                detail.story = Some(story);
                            }
                        }
                        Err(e) => error!("failed to load story detail: {e}"),
                    }
                    self.needs_repaint = true;
                }
                FetchEvent::Comment { epoch, comment } => {
                    if epoch != self.epoch {
                        continue;
                    }
                    if let Some(detail) = self.detail.as_mut() {
                        detail.comments.push(comment);
                    }
                    self.needs_repaint = true;
                }
                FetchEvent::DetailDone { epoch } => {
                    if epoch != self.epoch {
                        continue;
                    }
                    if let Some(detail) = self.detail.as_mut() {
                        detail.loading = false;
                    }
                    self.needs_repaint = true;
                }
            }
        }
    }

    fn hide_story(&mut self, id: u64) {
        // Persist failure is logged only; the card still animates out.
        if let Err(e) = self.hidden.hide(id) {
            error!(story_id = id, "failed to persist hidden story: {e}");
        }
        self.hiding.push((id, Instant::now()));
        self.needs_repaint = true;
    }

    /// Advance hide fade-outs; remove cards whose fade has finished and
    /// schedule a backfill check for the freed space.
    fn update_hide_animations(&mut self, ctx: &egui::Context) {
        if self.hiding.is_empty() {
            return;
        }
        let mut finished = Vec::new();
        self.hiding.retain(|(id, started)| {
            if started.elapsed().as_secs_f32() >= HIDE_FADE_SECS {
                finished.push(*id);
                false
            } else {
                true
            }
        });
        for id in finished {
            self.stories.retain(|s| s.id != id);
            self.backfill_check = true;
        }
        // Keep painting while a fade is running
        ctx.request_repaint();
    }

    fn hide_alpha(&self, id: u64) -> Option<f32> {
        self.hiding
            .iter()
            .find(|(hid, _)| *hid == id)
            .map(|(_, started)| 1.0 - (started.elapsed().as_secs_f32() / HIDE_FADE_SECS).min(1.0))
    }

    fn open_link(&self, url: &str) {
        if let Err(e) = open::that(url) {
            warn!("failed to open link {url}: {e}");
        }
    }

    fn toggle_theme(&mut self) {
        self.is_dark_mode = !self.is_dark_mode;
        self.theme = if self.is_dark_mode {
            AppTheme::dark()
        } else {
            AppTheme::light()
        };
    }

    fn refresh(&mut self) {
        // Re-activate the current route with a fresh epoch (and, for a
        // listing, a fresh id sequence)
        self.apply_route(self.history.current());
    }

    fn process_keyboard_shortcuts(&mut self, ctx: &egui::Context) {
        let (backspace, shift, num_keys) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Backspace),
                i.modifiers.shift,
                [
                    i.key_pressed(egui::Key::Num1),
                    i.key_pressed(egui::Key::Num2),
                    i.key_pressed(egui::Key::Num3),
                    i.key_pressed(egui::Key::Num4),
                    i.key_pressed(egui::Key::Num5),
                    i.key_pressed(egui::Key::Num6),
                ],
            )
        });

        if backspace {
            if shift {
                self.go_forward();
            } else {
                self.go_back();
            }
            return;
        }

        // 1-6 switch categories from the listing view
        if self.detail.is_none() {
            for (i, pressed) in num_keys.iter().enumerate() {
                if *pressed {
                    self.pending_route = Some(Route::Feed(Category::ALL[i]));
                    return;
                }
            }
        }
    }

    fn render_header(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading(
                RichText::new("HN Reader")
                    .color(self.theme.highlight)
                    .size(24.0),
            );
            ui.add_space(12.0);

            // Back / forward
            let back_btn = ui.add_enabled(
                self.history.can_go_back(),
                egui::Button::new(RichText::new("←").size(18.0))
                    .min_size(egui::Vec2::new(32.0, 28.0))
                    .corner_radius(CornerRadius::same(6)),
            );
            if back_btn.clicked() {
                self.go_back();
            }
            let forward_btn = ui.add_enabled(
                self.history.can_go_forward(),
                egui::Button::new(RichText::new("→").size(18.0))
                    .min_size(egui::Vec2::new(32.0, 28.0))
                    .corner_radius(CornerRadius::same(6)),
            );
            if forward_btn.clicked() {
                self.go_forward();
            }

            ui.add_space(12.0);
            self.render_tab_buttons(ui);

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                // Theme toggle
                let theme_icon = if self.is_dark_mode { "☀" } else { "☾" };
                let theme_btn = ui.add(
                    egui::Button::new(
                        RichText::new(theme_icon)
                            .color(self.theme.button_foreground)
                            .size(20.0),
                    )
                    .min_size(egui::Vec2::new(32.0, 32.0))
                    .corner_radius(CornerRadius::same(16))
                    .fill(self.theme.button_background),
                );
                if theme_btn.clicked() {
                    self.toggle_theme();
                }

                ui.add_space(8.0);

                // Refresh
                let refresh_btn = ui.add(
                    egui::Button::new(
                        RichText::new("↻")
                            .color(self.theme.button_foreground)
                            .size(20.0),
                    )
                    .min_size(egui::Vec2::new(32.0, 32.0))
                    .corner_radius(CornerRadius::same(16))
                    .fill(self.theme.button_background),
                );
                if refresh_btn.clicked() {
                    self.refresh();
                }
            });
        });
    }

    fn render_tab_buttons(&mut self, ui: &mut Ui) {
        let current = match self.history.current() {
            Route::Feed(category) => Some(category),
            Route::Story(_) => None,
        };

        for category in Category::ALL {
            let active = current == Some(category);
            let text_color = if active {
                self.theme.highlight
            } else {
                self.theme.button_foreground
            };
            let btn = ui.add(
                egui::Button::new(
                    RichText::new(category.label())
                        .color(text_color)
                        .size(15.0),
                )
                .min_size(egui::Vec2::new(52.0, 28.0))
                .corner_radius(CornerRadius::same(6))
                .fill(self.theme.button_background),
            );
            if btn.clicked() && !active {
                self.pending_route = Some(Route::Feed(category));
            }
            if btn.hovered() {
                ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
            }
        }
    }

    fn render_stories_list(&mut self, ui: &mut Ui) {
        let scroll_response = ScrollArea::vertical()
            .id_salt("stories_scroll_area")
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                if self.loading_ids {
                    ui.vertical_centered(|ui| {
                        ui.add_space(24.0);
                        ui.add(egui::Spinner::new().size(28.0));
                    });
                }
                self.render_story_cards(ui);
                ui.add_space(16.0);
            });

        // Scroll-threshold trigger: within one viewport height of the bottom
        // edge of the content, or a hide just freed viewport space.
        let offset = scroll_response.state.offset.y;
        let viewport_height = scroll_response.inner_rect.height();
        let content_height = scroll_response.content_size.y;
        let distance_to_bottom = content_height - offset - viewport_height;
        let near_bottom = distance_to_bottom < viewport_height;

        let backfill = std::mem::take(&mut self.backfill_check);
        let should_load = self
            .session
            .as_ref()
            .is_some_and(|s| s.wants_batch() && (near_bottom || backfill));

        if should_load {
            self.dispatch_batch();
        }
    }

    fn render_story_cards(&mut self, ui: &mut Ui) {
        let stories = self.stories.clone();

        for story in &stories {
            let alpha = self.hide_alpha(story.id);
            ui.scope(|ui| {
                if let Some(alpha) = alpha {
                    ui.multiply_opacity(alpha);
                }
                self.render_story_card(ui, story);
            });
        }
    }

    fn render_story_card(&mut self, ui: &mut Ui, story: &Story) {
        egui::Frame::new()
            .fill(self.theme.card_background)
            .corner_radius(CornerRadius::same(8))
            .stroke(Stroke::new(1.0, self.theme.separator))
            .inner_margin(12.0)
            .outer_margin(egui::vec2(8.0, 6.0))
            .show(ui, |ui| {
                // Title row
                ui.horizontal(|ui| {
                    let title_label = ui.add(
                        egui::Label::new(
                            RichText::new(&story.title)
                                .color(self.theme.text)
                                .size(16.0)
                                .strong(),
                        )
                        .sense(egui::Sense::click()),
                    );
                    if title_label.clicked() && !story.url.is_empty() {
                        self.open_link(&story.url);
                    }
                    if title_label.hovered() && !story.url.is_empty() {
                        ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
                    }

                    // Text-only posts have no url and get no domain label
                    if !story.domain.is_empty() {
                        ui.add_space(6.0);
                        ui.label(
                            RichText::new(format!("({})", story.domain))
                                .color(self.theme.secondary_text)
                                .italics(),
                        );
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            RichText::new(format!("{} pts", story.score))
                                .color(self.theme.score_color(story.score))
                                .strong(),
                        );
                    });
                });

                // Metadata + actions row
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(format!("by {}", story.by))
                            .color(self.theme.secondary_text)
                            .size(14.0),
                    );
                    ui.add_space(8.0);
                    ui.label(
                        RichText::new(format_time_ago(story.time))
                            .color(self.theme.secondary_text)
                            .size(14.0),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let hide_btn = ui.add_sized(
                            [56.0, 26.0],
                            egui::Button::new(
                                RichText::new("Hide")
                                    .size(14.0)
                                    .color(self.theme.button_foreground),
                            )
                            .corner_radius(CornerRadius::same(6))
                            .fill(self.theme.button_background),
                        );
                        if hide_btn.clicked() {
                            self.pending_hide = Some(story.id);
                        }

                        ui.add_space(6.0);
                        let comments_btn = ui.add_sized(
                            [110.0, 26.0],
                            egui::Button::new(
                                RichText::new(format!("{} comments", story.descendants))
                                    .size(14.0)
                                    .color(self.theme.button_foreground),
                            )
                            .corner_radius(CornerRadius::same(6))
                            .fill(self.theme.button_background),
                        );
                        if comments_btn.clicked() {
                            self.pending_route = Some(Route::Story(story.id));
                        }
                    });
                });
            });
    }

    fn render_detail(&mut self, ui: &mut Ui) {
        let Some(detail) = &self.detail else {
            return;
        };
        let story = detail.story.clone();
        let comments = detail.comments.clone();
        let loading = detail.loading;

        ScrollArea::vertical()
            .id_salt("detail_scroll_area")
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                if let Some(story) = &story {
                    self.render_detail_header(ui, story);

                    ui.add_space(8.0);
                    ui.label(
                        RichText::new("Comments")
                            .color(self.theme.text)
                            .size(18.0)
                            .strong(),
                    );
                    ui.add_space(4.0);

                    for comment in &comments {
                        self.render_comment(ui, comment);
                    }

                    if loading {
                        ui.vertical_centered(|ui| {
                            ui.add_space(8.0);
                            ui.add(egui::Spinner::new().size(20.0));
                        });
                    } else if comments.is_empty() {
                        ui.label(
                            RichText::new("No comments yet.")
                                .color(self.theme.secondary_text)
                                .italics(),
                        );
                    }
                } else if loading {
                    ui.vertical_centered(|ui| {
                        ui.add_space(24.0);
                        ui.add(egui::Spinner::new().size(28.0));
                    });
                }
                ui.add_space(16.0);
            });
    }

    fn render_detail_header(&mut self, ui: &mut Ui, story: &Story) {
        egui::Frame::new()
            .fill(self.theme.card_background)
            .corner_radius(CornerRadius::same(8))
            .stroke(Stroke::new(1.0, self.theme.separator))
            .inner_margin(12.0)
            .outer_margin(egui::vec2(8.0, 6.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let title_label = ui.add(
                        egui::Label::new(
                            RichText::new(&story.title)
                                .color(self.theme.text)
                                .size(18.0)
                                .strong(),
                        )
                        .sense(egui::Sense::click()),
                    );
                    if title_label.clicked() && !story.url.is_empty() {
                        self.open_link(&story.url);
                    }
                    if !story.domain.is_empty() {
                        ui.add_space(6.0);
                        ui.label(
                            RichText::new(format!("({})", story.domain))
                                .color(self.theme.secondary_text)
                                .italics(),
                        );
                    }
                });
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(format!("{} pts", story.score))
                            .color(self.theme.score_color(story.score))
                            .strong(),
                    );
                    ui.add_space(8.0);
                    ui.label(
                        RichText::new(format!("by {}", story.by))
                            .color(self.theme.secondary_text)
                            .size(14.0),
                    );
                    ui.add_space(8.0);
                    ui.label(
                        RichText::new(format_time_ago(story.time))
                            .color(self.theme.secondary_text)
                            .size(14.0),
                    );
                    ui.add_space(8.0);
                    ui.label(
                        RichText::new(format!("{} comments", story.descendants))
                            .color(self.theme.secondary_text)
                            .size(14.0),
                    );
                });
                if !story.text.is_empty() {
                    ui.add_space(6.0);
                    ui.label(RichText::new(&story.text).color(self.theme.text).size(14.0));
                }
            });
    }

    fn render_comment(&self, ui: &mut Ui, comment: &Comment) {
        // Deleted comments come back with no author and no text
        if comment.text.is_empty() && comment.by.is_empty() {
            return;
        }
        egui::Frame::new()
            .fill(self.theme.card_background)
            .corner_radius(CornerRadius::same(6))
            .stroke(Stroke::new(1.0, self.theme.separator))
            .inner_margin(10.0)
            .outer_margin(egui::vec2(8.0, 4.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(&comment.by)
                            .color(self.theme.highlight)
                            .size(14.0)
                            .strong(),
                    );
                    ui.add_space(6.0);
                    ui.label(
                        RichText::new(format_time_ago(comment.time))
                            .color(self.theme.secondary_text)
                            .size(13.0),
                    );
                });
                ui.label(RichText::new(&comment.text).color(self.theme.text).size(14.0));
            });
    }
}

impl eframe::App for HnReaderApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        storage.set_string("is_dark_mode", self.is_dark_mode.to_string());
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.theme.apply_to_ctx(ctx);

        // All fetch results land here, on the UI thread, before rendering
        self.drain_events();

        if !self.initialized {
            self.initialized = true;
            self.apply_route(self.history.current());
        }

        self.update_hide_animations(ctx);
        self.process_keyboard_shortcuts(ctx);

        // Deferred actions from last frame's render closures
        if let Some(route) = self.pending_route.take() {
            self.navigate(route);
        }
        if let Some(id) = self.pending_hide.take() {
            self.hide_story(id);
        }

        if self.needs_repaint {
            ctx.request_repaint();
            self.needs_repaint = false;
        }

        // No animation drives frames between a batch's dispatch and its
        // last arrival; keep polling so results do not sit in the channel
        // until the next input event.
        let detail_loading = self.detail.as_ref().is_some_and(|d| d.loading);
        if has_pending_fetches(self.in_flight, self.loading_ids, detail_loading) {
            ctx.request_repaint_after(FETCH_POLL_INTERVAL);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_header(ui);
            ui.add_space(4.0);
            ui.separator();

            if self.detail.is_some() {
                self.render_detail(ui);
            } else {
                self.render_stories_list(ui);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polling_continues_while_a_batch_is_in_flight() {
        // After the id list drains, the spinner is gone but the batch's
        // story fetches are still outstanding; frames must keep coming.
        assert!(has_pending_fetches(10, false, false));
        assert!(has_pending_fetches(1, false, false));
    }

    #[test]
    fn polling_covers_id_and_detail_loads() {
        assert!(has_pending_fetches(0, true, false));
        assert!(has_pending_fetches(0, false, true));
    }

    #[test]
    fn polling_stops_once_everything_has_drained() {
        assert!(!has_pending_fetches(0, false, false));
    }
}
