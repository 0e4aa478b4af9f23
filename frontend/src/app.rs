use std::time::Instant;

use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Stroke, Vec2};
use gridsearch::{
    CellStatus, GridMap, PathFinder, PathFinderState, Point, SearchError, StepResult,
};
use log::{debug, info, warn};

use crate::input::{pixel_to_cell, primary_click_kind, space_starts_search};
use crate::settings::Settings;

const COLOR_BACKGROUND: Color32 = Color32::WHITE;
const COLOR_GRID_LINE: Color32 = Color32::from_rgb(100, 100, 100);
const COLOR_WALL: Color32 = Color32::BLACK;
const COLOR_START: Color32 = Color32::from_rgb(255, 0, 0);
const COLOR_END: Color32 = Color32::from_rgb(255, 165, 0);
const COLOR_VISITED: Color32 = Color32::from_rgb(0, 0, 255);
const COLOR_OPEN: Color32 = Color32::from_rgb(110, 140, 255);
const COLOR_PATH: Color32 = Color32::from_rgb(0, 255, 0);
const COLOR_LABEL: Color32 = Color32::WHITE;

pub struct App {
    settings: Settings,
    map: GridMap,
    finder: PathFinder,
    last_step: Option<Instant>,
    output_cell: String,
    output_pathfinder: String,
}

impl App {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());
        Self::with_settings(settings)
    }

    fn with_settings(settings: Settings) -> Self {
        App {
            map: GridMap::new(settings.grid_size),
            settings,
            finder: PathFinder::new(),
            last_step: None,
            output_cell: Default::default(),
            output_pathfinder: "Place a start and an end".to_owned(),
        }
    }

    fn start_search(&mut self) {
        match self.finder.start(&mut self.map) {
            Ok(()) => {
                self.last_step = None;
                self.output_pathfinder = "Searching...".to_owned();
            }
            Err(e) => {
                warn!("cannot start search: {}", e);
                self.output_pathfinder = match e {
                    SearchError::MissingStart => "Place a start first".to_owned(),
                    SearchError::MissingEnd => "Place an end first".to_owned(),
                    SearchError::NotStarted | SearchError::GridChanged => e.to_string(),
                };
            }
        }
    }

    fn step(&mut self) {
        match self.finder.advance(&mut self.map) {
            Ok(result) => {
                self.last_step = Some(Instant::now());
                self.update_output(result);
            }
            Err(e) => debug!("step ignored: {}", e),
        }
    }

    fn finish(&mut self) {
        match self.finder.finish(&mut self.map) {
            Ok(result) => self.update_output(result),
            Err(e) => debug!("finish ignored: {}", e),
        }
    }

    /// Abandons a running search, leaving its markers on the grid
    fn cancel(&mut self) {
        if self.finder.is_running() {
            info!("search cancelled after {} steps", self.finder.steps());
            self.finder.reset();
            self.output_pathfinder = "Search cancelled".to_owned();
        }
    }

    /// Forgets the current run, whatever state it is in
    fn drop_search(&mut self) {
        if !matches!(self.finder.state(), PathFinderState::Idle) {
            debug!("dropping search after {} steps", self.finder.steps());
            self.finder.reset();
        }
    }

    fn update_output(&mut self, result: StepResult) {
        self.output_pathfinder = match result {
            StepResult::InProgress => format!("Searching... step {}", self.finder.steps()),
            StepResult::Found => match self.finder.path() {
                Some(found) => format!(
                    "Path found: {} cells, distance {}\n{} steps",
                    found.path.len(),
                    found.total_cost,
                    self.finder.steps()
                ),
                None => "Path found".to_owned(),
            },
            StepResult::Exhausted => format!("No path found\n{} steps", self.finder.steps()),
        };
    }

    /// Applies a click on a cell. Any change to the grid ends the current run.
    fn on_click(&mut self, point: Point, primary: bool) {
        let changed = if primary {
            match primary_click_kind(&self.map, point) {
                Some(kind) => self.map.place(point, kind),
                None => false,
            }
        } else {
            self.map.erase(point)
        };

        if changed {
            self.drop_search();
        }
    }

    fn cell_rect(&self, origin: Pos2, point: Point) -> Rect {
        let size = self.settings.cell_size;
        Rect::from_min_size(
            origin + Vec2::new(point.col as f32 * size, point.row as f32 * size),
            Vec2::splat(size),
        )
    }

    fn cell_color(&self, point: Point, status: CellStatus) -> Option<Color32> {
        match status {
            CellStatus::Empty => None,
            CellStatus::Wall => Some(COLOR_WALL),
            CellStatus::Start => Some(COLOR_START),
            CellStatus::End => Some(COLOR_END),
            CellStatus::Path => Some(COLOR_PATH),
            CellStatus::Frontier => match self.finder.search() {
                Some(search) if !search.is_visited(point) => Some(COLOR_OPEN),
                // without a search to ask, leftover markers count as closed
                _ => Some(COLOR_VISITED),
            },
        }
    }

    fn paint_grid(&self, painter: &Painter, origin: Pos2) {
        let extent = self.settings.grid_extent();
        painter.rect_filled(
            Rect::from_min_size(origin, Vec2::splat(extent)),
            0.0,
            COLOR_BACKGROUND,
        );

        let font = FontId::proportional(self.settings.cell_size * 0.6);
        for point in self.map.points() {
            let Some(status) = self.map.status_of(point) else {
                continue;
            };
            let rect = self.cell_rect(origin, point);

            if let Some(color) = self.cell_color(point, status) {
                painter.rect_filled(rect, 0.0, color);
            }

            let label = match status {
                CellStatus::Start => "S",
                CellStatus::End => "E",
                _ => continue,
            };
            painter.text(rect.center(), Align2::CENTER_CENTER, label, font.clone(), COLOR_LABEL);
        }

        if self.settings.draw_grid_lines {
            let stroke = Stroke::new(1.0, COLOR_GRID_LINE);
            for i in 0..=self.map.size() {
                let offset = i as f32 * self.settings.cell_size;
                painter.line_segment(
                    [origin + Vec2::new(0.0, offset), origin + Vec2::new(extent, offset)],
                    stroke,
                );
                painter.line_segment(
                    [origin + Vec2::new(offset, 0.0), origin + Vec2::new(offset, extent)],
                    stroke,
                );
            }
        }
    }

    fn describe_cell(&self, point: Point) -> String {
        let status = self.map.status_of(point).unwrap_or_default();
        let mut text = format!("Cell @{}:{}\n{:?}", point.row, point.col, status);
        if let Some(search) = self.finder.search() {
            match search.distance(point) {
                Some(d) => text.push_str(&format!("\ndistance: {}", d)),
                None => text.push_str("\ndistance: -"),
            }
            if let Some(from) = search.previous(point) {
                text.push_str(&format!("\nfrom: {}", from));
            }
            if search.is_visited(point) {
                text.push_str("\nvisited");
            }
        }
        text
    }
}

impl eframe::App for App {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let (space, escape) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::Escape),
            )
        });
        let widget_focused = ctx.memory(|m| m.focused().is_some());
        if space_starts_search(space, widget_focused, self.finder.is_running()) {
            self.start_search();
        }
        if escape {
            self.cancel();
        }

        if self.finder.is_running() && self.settings.auto_step {
            let delay = self.settings.step_delay();
            if self.last_step.map_or(true, |t| t.elapsed() >= delay) {
                self.step();
            }
            ctx.request_repaint_after(delay);
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.add_space(16.0);

                egui::widgets::global_dark_light_mode_buttons(ui);
            });
        });

        egui::SidePanel::left("side_panel").show(ctx, |ui| {
            ui.label("Pathfinder");
            ui.horizontal(|ui| {
                if ui.button("Start").clicked() {
                    self.start_search();
                }
                if ui.button("Step").clicked() {
                    self.step();
                }
                if ui.button("Finish").clicked() {
                    self.finish();
                }
            });
            ui.horizontal(|ui| {
                if ui.button("Reset").clicked() {
                    self.drop_search();
                    self.map.clear_search_marks();
                    self.output_pathfinder.clear();
                }
                if ui.button("Clear grid").clicked() {
                    self.drop_search();
                    self.map.clear_all();
                    self.output_pathfinder = "Place a start and an end".to_owned();
                }
            });
            ui.checkbox(&mut self.settings.auto_step, "Auto Step");
            ui.checkbox(&mut self.settings.draw_grid_lines, "Draw grid lines");

            ui.separator();
            ui.label(&self.output_pathfinder);
            ui.separator();
            ui.label(&self.output_cell);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| {
                let extent = self.settings.grid_extent();
                let (response, painter) =
                    ui.allocate_painter(Vec2::splat(extent), Sense::click());
                let origin = response.rect.min;
                let cell_size = self.settings.cell_size;
                let grid_size = self.map.size();

                let to_cell = move |pos: Pos2| {
                    let rel = pos - origin;
                    pixel_to_cell(rel.x, rel.y, cell_size, grid_size)
                };

                let clicked = if response.clicked() {
                    Some(true)
                } else if response.secondary_clicked() {
                    Some(false)
                } else {
                    None
                };
                if let Some(primary) = clicked {
                    if let Some(point) = response.interact_pointer_pos().and_then(to_cell) {
                        self.on_click(point, primary);
                    }
                }

                if let Some(point) = response.hover_pos().and_then(to_cell) {
                    self.output_cell = self.describe_cell(point);
                }

                self.paint_grid(&painter, origin);

                ui.add_space(8.0);
                ui.label("Left Click: Place Start (S), End (E), or Wall");
                ui.label("Right Click: Remove nodes or walls");
                ui.label("Press SPACE to start Dijkstra, ESC to cancel");
            });
        });
    }
}
