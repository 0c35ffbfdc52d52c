use crate::model::{MovingObject, ObjectKind};
use crate::session::{ObjectId, Panel, Presenter};
use crossterm::{
    cursor, execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::collections::BTreeMap;
use std::io::{self, Write};

pub(crate) const HUD_ROWS: u16 = 2;
pub(crate) const FOOTER_ROWS: u16 = 1;

// logical track pixels per terminal cell
pub(crate) const CELL_W_PX: f32 = 10.0;
pub(crate) const CELL_H_PX: f32 = 40.0;

const MIN_TRACK_COLS: u16 = 42;
const MIN_TRACK_ROWS: u16 = 13;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
    pub(crate) bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
            bold: false,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        self.cells.fill(Cell { bg, ..Cell::default() });
    }
}

/// Where the track sits on screen. Track size in cells never changes after startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Viewport {
    pub(crate) term_w: u16,
    pub(crate) term_h: u16,
    pub(crate) track_x: u16,
    pub(crate) track_y: u16,
    pub(crate) track_cols: u16,
    pub(crate) track_rows: u16,
}

pub(crate) fn fit_view(term_w: u16, term_h: u16) -> Option<Viewport> {
    if term_w < MIN_TRACK_COLS + 2 || term_h < HUD_ROWS + FOOTER_ROWS + MIN_TRACK_ROWS {
        return None;
    }
    let track_rows = term_h - HUD_ROWS - FOOTER_ROWS;
    let track_cols = (term_w / 2).clamp(MIN_TRACK_COLS, term_w - 2);
    Some(Viewport {
        term_w,
        term_h,
        track_x: (term_w - track_cols) / 2,
        track_y: HUD_ROWS,
        track_cols,
        track_rows,
    })
}

impl Viewport {
    pub(crate) fn track_size_px(&self) -> (f32, f32) {
        (
            self.track_cols as f32 * CELL_W_PX,
            self.track_rows as f32 * CELL_H_PX,
        )
    }

    /// Keeps the track size, re-centres it in a resized terminal.
    pub(crate) fn recenter(&mut self, term_w: u16, term_h: u16) {
        self.term_w = term_w;
        self.term_h = term_h;
        self.track_x = term_w.saturating_sub(self.track_cols) / 2;
    }
}

/// Cells `[first, last)` covered by `[start, start + len)` px.
pub(crate) fn px_span(start: f32, len: f32, cell: f32) -> (i32, i32) {
    let first = (start / cell).floor() as i32;
    let last = ((start + len) / cell).ceil() as i32;
    (first, last)
}

#[derive(Clone, Copy)]
struct Theme {
    hud_fg: Color,
    hud_bg: Color,
    verge_bg: Color,
    road_bg: Color,
    line_fg: Color,
    player_fg: Color,
    enemy_fg: Color,
    accent_fg: Color,
}

const THEME: Theme = Theme {
    hud_fg: Color::Rgb {
        r: 200,
        g: 220,
        b: 255,
    },
    hud_bg: Color::Rgb { r: 6, g: 8, b: 14 },
    verge_bg: Color::Rgb { r: 12, g: 30, b: 14 },
    road_bg: Color::Rgb {
        r: 28,
        g: 28,
        b: 32,
    },
    line_fg: Color::Rgb {
        r: 235,
        g: 235,
        b: 235,
    },
    player_fg: Color::Rgb {
        r: 120,
        g: 220,
        b: 255,
    },
    enemy_fg: Color::Rgb {
        r: 255,
        g: 110,
        b: 90,
    },
    accent_fg: Color::Rgb {
        r: 255,
        g: 220,
        b: 120,
    },
};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Sprite {
    kind: ObjectKind,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

/// Retained scene the session pushes into; `draw` paints it each frame.
pub(crate) struct TerminalPresenter {
    sprites: BTreeMap<ObjectId, Sprite>,
    score: u64,
    best: u64,
    final_score: u64,
    start_visible: bool,
    score_visible: bool,
    end_visible: bool,
    new_best: bool,
    enable_color: bool,
}

impl Presenter for TerminalPresenter {
    fn clear_objects(&mut self) {
        self.sprites.clear();
    }

    fn put_object(&mut self, id: ObjectId, obj: &MovingObject) {
        self.sprites.insert(
            id,
            Sprite {
                kind: obj.kind,
                x: obj.x,
                y: obj.y,
                w: obj.width,
                h: obj.height,
            },
        );
    }

    fn set_score(&mut self, distance: u64) {
        self.score = distance;
    }

    fn set_best_score(&mut self, best: u64) {
        self.best = best;
    }

    fn set_final_score(&mut self, distance: u64) {
        self.final_score = distance;
    }

    fn set_panel(&mut self, panel: Panel, visible: bool) {
        match panel {
            Panel::Start => self.start_visible = visible,
            Panel::Score => self.score_visible = visible,
            Panel::End => self.end_visible = visible,
        }
    }

    fn set_new_best(&mut self, visible: bool) {
        self.new_best = visible;
    }
}

impl TerminalPresenter {
    pub(crate) fn new(enable_color: bool) -> Self {
        Self {
            sprites: BTreeMap::new(),
            score: 0,
            best: 0,
            final_score: 0,
            start_visible: false,
            score_visible: false,
            end_visible: false,
            new_best: false,
            enable_color,
        }
    }

    fn color(&self, c: Color, fallback: Color) -> Color {
        if self.enable_color {
            c
        } else {
            fallback
        }
    }

    pub(crate) fn draw(&self, buf: &mut CellBuffer, v: &Viewport) {
        let hud_fg = self.color(THEME.hud_fg, Color::White);
        let hud_bg = self.color(THEME.hud_bg, Color::Black);
        buf.clear(hud_bg);

        self.draw_track(buf, v);

        // HUD
        let line1 = if self.score_visible {
            format!(
                "LANEDASH  |  Distance {:06}  Best {:06}",
                self.score, self.best
            )
        } else {
            format!("LANEDASH  |  Best {:06}", self.best)
        };
        draw_text(buf, 0, 0, &line1, hud_fg, hud_bg);
        draw_text(
            buf,
            0,
            1,
            "Left/Right steer   Enter start   Q quit",
            hud_fg,
            hud_bg,
        );

        let footer = format!("(Terminal: {}x{})", v.term_w, v.term_h);
        draw_text(buf, 0, v.term_h.saturating_sub(1), &footer, hud_fg, hud_bg);

        if self.start_visible {
            let best = format!("Best distance: {}", self.best);
            self.draw_center_box(
                buf,
                "LANEDASH",
                &[
                    "Dodge the oncoming traffic.",
                    "",
                    best.as_str(),
                    "",
                    "Enter start   Left/Right steer   Q quit",
                ],
            );
        }

        if self.end_visible {
            let distance = format!("Distance: {}", self.final_score);
            let best = format!("Best:     {}", self.best);
            let flag = if self.new_best { "NEW BEST!" } else { "" };
            self.draw_center_box(
                buf,
                "GAME OVER",
                &[distance.as_str(), best.as_str(), flag, "", "R race again   Q quit"],
            );
        }
    }

    fn draw_track(&self, buf: &mut CellBuffer, v: &Viewport) {
        let verge = self.color(THEME.verge_bg, Color::Black);
        let road = self.color(THEME.road_bg, Color::Black);

        for row in 0..v.track_rows {
            let y = v.track_y + row;
            for x in 0..v.term_w {
                let inside = x >= v.track_x && x < v.track_x + v.track_cols;
                let edge = x + 1 == v.track_x || x == v.track_x + v.track_cols;
                let ch = if edge { '║' } else { ' ' };
                buf.set(
                    x,
                    y,
                    Cell {
                        ch,
                        fg: self.color(THEME.line_fg, Color::White),
                        bg: if inside { road } else { verge },
                        bold: false,
                    },
                );
            }
        }

        // lines under cars
        let mut order: Vec<&Sprite> = self.sprites.values().collect();
        order.sort_by_key(|s| match s.kind {
            ObjectKind::RoadLine => 0,
            ObjectKind::Enemy => 1,
            ObjectKind::Player => 2,
        });

        for s in order {
            let (ch, fg, bold) = match s.kind {
                ObjectKind::RoadLine => ('┃', self.color(THEME.line_fg, Color::White), false),
                ObjectKind::Enemy => ('▒', self.color(THEME.enemy_fg, Color::White), false),
                ObjectKind::Player => ('█', self.color(THEME.player_fg, Color::White), true),
            };
            let (c0, c1) = px_span(s.x, s.w, CELL_W_PX);
            let (r0, r1) = px_span(s.y, s.h, CELL_H_PX);
            for r in r0.max(0)..r1.min(v.track_rows as i32) {
                for c in c0.max(0)..c1.min(v.track_cols as i32) {
                    buf.set(
                        v.track_x + c as u16,
                        v.track_y + r as u16,
                        Cell { ch, fg, bg: road, bold },
                    );
                }
            }
        }
    }

    fn draw_center_box(&self, buf: &mut CellBuffer, title: &str, body: &[&str]) {
        let fg = self.color(Color::White, Color::White);
        let bg = Color::Black;
        let accent = self.color(THEME.accent_fg, Color::White);

        let w = buf.w;
        let h = buf.h;
        let bw = std::cmp::min(48, w.saturating_sub(4));
        let bh = std::cmp::min(body.len() as u16 + 5, h.saturating_sub(2));
        if bw < 4 || bh < 4 {
            return;
        }
        let x0 = (w - bw) / 2;
        let y0 = (h - bh) / 2;

        for y in y0..y0 + bh {
            for x in x0..x0 + bw {
                let top = y == y0;
                let bottom = y == y0 + bh - 1;
                let left = x == x0;
                let right = x == x0 + bw - 1;
                let ch = match (top, bottom, left, right) {
                    (true, _, true, _) => '┌',
                    (true, _, _, true) => '┐',
                    (_, true, true, _) => '└',
                    (_, true, _, true) => '┘',
                    (true, _, _, _) | (_, true, _, _) => '─',
                    (_, _, true, _) | (_, _, _, true) => '│',
                    _ => ' ',
                };
                buf.set(x, y, Cell { ch, fg, bg, bold: false });
            }
        }

        draw_text(buf, x0 + 2, y0 + 1, title, accent, bg);
        for (i, line) in body.iter().enumerate() {
            let yy = y0 + 3 + i as u16;
            if yy >= y0 + bh - 1 {
                break;
            }
            draw_text(buf, x0 + 2, yy, line, fg, bg);
        }
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    let mut xx = x;
    for ch in s.chars() {
        if xx >= buf.w {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg, bold: false });
        xx += 1;
    }
}

pub(crate) struct Terminal {
    out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    prev: CellBuffer,
    pub(crate) cur: CellBuffer,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            Clear(ClearType::All)
        )?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    /// Writes only the cells that changed since the last frame.
    /// Writes only the changed spans of each row, one cursor move per span.
    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut style: Option<(Color, Color, bool)> = None;
        for y in 0..self.rows {
            for (x0, x1) in changed_spans(&self.prev, &self.cur, y) {
                queue!(self.out, cursor::MoveTo(x0, y))?;
                for x in x0..x1 {
                    let c = self.cur.cells[self.cur.idx(x, y)];
                    let want = (c.fg, c.bg, c.bold);
                    if style != Some(want) {
                        let attr = if c.bold {
                            Attribute::Bold
                        } else {
                            Attribute::NormalIntensity
                        };
                        queue!(
                            self.out,
                            SetAttribute(attr),
                            SetForegroundColor(c.fg),
                            SetBackgroundColor(c.bg)
                        )?;
                        style = Some(want);
                    }
                    queue!(self.out, Print(c.ch))?;
                }
            }
        }

        queue!(self.out, SetAttribute(Attribute::Reset), ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/// Half-open column ranges of row `y` where `cur` differs from `prev`.
pub(crate) fn changed_spans(prev: &CellBuffer, cur: &CellBuffer, y: u16) -> Vec<(u16, u16)> {
    let mut spans = Vec::new();
    let mut open: Option<u16> = None;
    for x in 0..cur.w {
        let i = cur.idx(x, y);
        match (prev.cells[i] != cur.cells[i], open) {
            (true, None) => open = Some(x),
            (false, Some(x0)) => {
                spans.push((x0, x));
                open = None;
            }
            _ => {}
        }
    }
    if let Some(x0) = open {
        spans.push((x0, cur.w));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::model::{MovingObject, Player};

    #[test]
    fn only_changed_spans_are_redrawn() {
        let prev = CellBuffer::new(8, 2);
        let mut cur = CellBuffer::new(8, 2);
        let car = Cell { ch: '#', ..Cell::default() };
        for x in [1, 2, 5, 7] {
            cur.set(x, 0, car);
        }
        assert_eq!(changed_spans(&prev, &cur, 0), vec![(1, 3), (5, 6), (7, 8)]);
        assert!(changed_spans(&prev, &cur, 1).is_empty());

        cur.clear(Color::Black);
        assert!(changed_spans(&prev, &cur, 0).is_empty());
        cur.clear(Color::DarkGrey);
        assert_eq!(changed_spans(&prev, &cur, 1), vec![(0, 8)]);
    }

    #[test]
    fn too_small_terminal_does_not_fit() {
        assert!(fit_view(30, 40).is_none());
        assert!(fit_view(120, 10).is_none());
    }

    #[test]
    fn track_is_centred_and_half_width() {
        let v = fit_view(120, 40).unwrap();
        assert_eq!(v.track_cols, 60);
        assert_eq!(v.track_x, 30);
        assert_eq!(v.track_rows, 37);
        assert_eq!(v.track_size_px(), (600.0, 1480.0));
    }

    #[test]
    fn narrow_terminal_gets_minimum_track() {
        let v = fit_view(50, 24).unwrap();
        assert_eq!(v.track_cols, 42);
        assert_eq!(v.track_x, 4);
    }

    #[test]
    fn fitted_track_passes_config_validation() {
        let v = fit_view(44, 16).unwrap();
        let (w, h) = v.track_size_px();
        assert!(GameConfig::for_track(w, h).validate().is_ok());
    }

    #[test]
    fn recenter_keeps_track_size() {
        let mut v = fit_view(120, 40).unwrap();
        v.recenter(100, 50);
        assert_eq!(v.track_cols, 60);
        assert_eq!(v.track_x, 20);
    }

    #[test]
    fn pixel_spans_cover_partial_cells() {
        assert_eq!(px_span(640.0, 160.0, 40.0), (16, 20));
        assert_eq!(px_span(-90.0, 90.0, 40.0), (-3, 0));
        assert_eq!(px_span(135.0, 10.0, 10.0), (13, 15));
    }

    #[test]
    fn player_is_drawn_on_the_bottom_rows_of_the_track() {
        let v = fit_view(120, 40).unwrap();
        let (w, h) = v.track_size_px();
        let cfg = GameConfig::for_track(w, h);
        let mut p = TerminalPresenter::new(false);
        p.put_object(0, &Player::new(&cfg).body);
        p.put_object(1, &MovingObject::enemy(2, -500.0, &cfg));

        let mut buf = CellBuffer::new(v.term_w, v.term_h);
        p.draw(&mut buf, &v);

        let bottom_row = v.track_y + v.track_rows - 1;
        assert_eq!(buf.cells[buf.idx(v.track_x, bottom_row)].ch, '█');
        assert_eq!(buf.cells[buf.idx(v.track_x, v.track_y)].ch, ' ');
        // off-screen enemy leaves no trace
        assert!(buf.cells.iter().all(|c| c.ch != '▒'));
    }

    #[test]
    fn end_panel_shows_new_best() {
        let v = fit_view(120, 40).unwrap();
        let mut p = TerminalPresenter::new(true);
        p.set_final_score(250);
        p.set_best_score(250);
        p.set_new_best(true);
        p.set_panel(Panel::End, true);

        let mut buf = CellBuffer::new(v.term_w, v.term_h);
        p.draw(&mut buf, &v);
        let text: String = buf.cells.iter().map(|c| c.ch).collect();
        assert!(text.contains("GAME OVER"));
        assert!(text.contains("NEW BEST!"));
        assert!(text.contains("Distance: 250"));
    }
}
