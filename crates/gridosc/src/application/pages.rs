//! Pages: several applications sharing one grid.
//!
//! A [`PageMultiplexer`] sits between a device connection and N
//! applications.  Each application lives on its own [`Page`] and draws into
//! a [`PageView`]; only the page currently selected reaches the hardware.
//!
//! # How switching works (for beginners)
//!
//! One corner button is reserved.  Holding it shows a "chooser" overlay:
//!
//! ```text
//!   16×8 grid, 3 pages, page 1 selected:
//!
//!   . X . . . . . . . . . . . . . .
//!   . X . . . . . . . . . . . . . .
//!   ...
//!   X X X . . . . . . . . . . . . .   ← one lit cell per page
//!       ↑
//!       selected page's column is lit top to bottom
//! ```
//!
//! While the corner is held, pressing any key in column `n` selects page `n`.
//! Releasing the corner redraws the selected page from its LED mirror.
//!
//! Because every page keeps a [`BitBuffer`] mirror of everything it drew,
//! an inactive page can keep drawing in the background and the redraw on
//! switch is instantaneous.
//!
//! Keys held down when the chooser opens are released on the page that saw
//! them pressed, so an application never sees a press without a release.

use std::collections::BTreeSet;

use gridosc_core::domain::bit_buffer::{LedMap, MAP_SIZE};
use gridosc_core::{BitBuffer, KeyEvent, PageCorner, TiltEvent};
use tracing::debug;

use crate::application::grid_client::{Grid, GridApp};

/// Intensity a page starts with (the device maximum).
pub const DEFAULT_INTENSITY: u8 = 15;

// ── Page ──────────────────────────────────────────────────────────────────────

/// One application plus its LED mirror.
pub struct Page {
    app: Box<dyn GridApp + Send>,
    /// Allocated on `ready`, once the device size is known.
    buffer: Option<BitBuffer>,
    intensity: u8,
}

impl Page {
    fn new(app: Box<dyn GridApp + Send>) -> Self {
        Self {
            app,
            buffer: None,
            intensity: DEFAULT_INTENSITY,
        }
    }

    /// Runs `f` with this page's application and a view onto its mirror.
    ///
    /// `device` is `Some` only when the page is showing.  Returns `None` if
    /// the buffer is not allocated yet.
    fn run<R>(
        &mut self,
        device: Option<&mut (dyn Grid + '_)>,
        f: impl FnOnce(&mut dyn GridApp, &mut dyn Grid) -> R,
    ) -> Option<R> {
        let buffer = self.buffer.as_mut()?;
        let mut view = PageView {
            buffer,
            intensity: &mut self.intensity,
            device,
        };
        Some(f(self.app.as_mut(), &mut view))
    }
}

/// The [`Grid`] a paged application draws on.
///
/// Binary LED writes and intensity are recorded in the page's mirror and
/// forwarded to the device when the page is showing.  Level writes and
/// `tilt_set` have no mirror; they are forwarded when showing and dropped
/// otherwise.
pub struct PageView<'a, 'd> {
    buffer: &'a mut BitBuffer,
    intensity: &'a mut u8,
    device: Option<&'a mut (dyn Grid + 'd)>,
}

impl PageView<'_, '_> {
    /// Whether writes currently reach the device.
    pub fn is_active(&self) -> bool {
        self.device.is_some()
    }
}

impl Grid for PageView<'_, '_> {
    fn width(&self) -> u32 {
        self.buffer.width()
    }

    fn height(&self) -> u32 {
        self.buffer.height()
    }

    fn led_set(&mut self, x: u32, y: u32, s: u8) {
        self.buffer.led_set(x, y, s);
        if let Some(device) = self.device.as_deref_mut() {
            device.led_set(x, y, s);
        }
    }

    fn led_all(&mut self, s: u8) {
        self.buffer.led_all(s);
        if let Some(device) = self.device.as_deref_mut() {
            device.led_all(s);
        }
    }

    fn led_map(&mut self, x_offset: u32, y_offset: u32, rows: &LedMap) {
        self.buffer.led_map(x_offset, y_offset, rows);
        if let Some(device) = self.device.as_deref_mut() {
            device.led_map(x_offset, y_offset, rows);
        }
    }

    fn led_row(&mut self, x_offset: u32, y: u32, data: &[u8]) {
        self.buffer.led_row(x_offset, y, data);
        if let Some(device) = self.device.as_deref_mut() {
            device.led_row(x_offset, y, data);
        }
    }

    fn led_col(&mut self, x: u32, y_offset: u32, data: &[u8]) {
        self.buffer.led_col(x, y_offset, data);
        if let Some(device) = self.device.as_deref_mut() {
            device.led_col(x, y_offset, data);
        }
    }

    fn led_intensity(&mut self, i: u8) {
        *self.intensity = i;
        if let Some(device) = self.device.as_deref_mut() {
            device.led_intensity(i);
        }
    }

    fn led_level_set(&mut self, x: u32, y: u32, level: u8) {
        if let Some(device) = self.device.as_deref_mut() {
            device.led_level_set(x, y, level);
        }
    }

    fn led_level_all(&mut self, level: u8) {
        if let Some(device) = self.device.as_deref_mut() {
            device.led_level_all(level);
        }
    }

    fn led_level_map(&mut self, x_offset: u32, y_offset: u32, levels: &[u8]) {
        if let Some(device) = self.device.as_deref_mut() {
            device.led_level_map(x_offset, y_offset, levels);
        }
    }

    fn led_level_row(&mut self, x_offset: u32, y: u32, levels: &[u8]) {
        if let Some(device) = self.device.as_deref_mut() {
            device.led_level_row(x_offset, y, levels);
        }
    }

    fn led_level_col(&mut self, x: u32, y_offset: u32, levels: &[u8]) {
        if let Some(device) = self.device.as_deref_mut() {
            device.led_level_col(x, y_offset, levels);
        }
    }

    fn tilt_set(&mut self, sensor: u32, enabled: bool) {
        if let Some(device) = self.device.as_deref_mut() {
            device.tilt_set(sensor, enabled);
        }
    }
}

// ── PageMultiplexer ───────────────────────────────────────────────────────────

/// Shares one grid between several applications.
///
/// The multiplexer is itself a [`GridApp`], so it plugs into a
/// [`GridConnection`](crate::application::grid_client::GridConnection) like
/// any other application.
pub struct PageMultiplexer {
    pages: Vec<Page>,
    current: usize,
    switching: bool,
    /// Non-switch keys currently held on the current page.
    pressed: BTreeSet<(u32, u32)>,
    corner: PageCorner,
    /// Known once the device size is; `None` before `ready`.
    switch_button: Option<(u32, u32)>,
}

impl PageMultiplexer {
    /// Creates a multiplexer showing the first of `apps`.
    pub fn new(apps: Vec<Box<dyn GridApp + Send>>, corner: PageCorner) -> Self {
        Self {
            pages: apps.into_iter().map(Page::new).collect(),
            current: 0,
            switching: false,
            pressed: BTreeSet::new(),
            corner,
            switch_button: None,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Index of the page that is (or, while switching, will be) showing.
    pub fn current_page(&self) -> usize {
        self.current
    }

    pub fn is_switching(&self) -> bool {
        self.switching
    }

    pub fn corner(&self) -> PageCorner {
        self.corner
    }

    pub fn switch_button(&self) -> Option<(u32, u32)> {
        self.switch_button
    }

    /// Keys currently held on the current page, in coordinate order.
    pub fn pressed(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.pressed.iter().copied()
    }

    /// The LED mirror of page `index`, once allocated.
    pub fn page_buffer(&self, index: usize) -> Option<&BitBuffer> {
        self.pages.get(index)?.buffer.as_ref()
    }

    pub fn page_intensity(&self, index: usize) -> Option<u8> {
        self.pages.get(index).map(|page| page.intensity)
    }

    /// Runs `f` against page `index` outside of an event handler, so the
    /// embedding program can draw into any page at any time.
    ///
    /// Returns `None` for an unknown index or before `ready`.
    pub fn with_page<R>(
        &mut self,
        index: usize,
        grid: &mut dyn Grid,
        f: impl FnOnce(&mut dyn GridApp, &mut dyn Grid) -> R,
    ) -> Option<R> {
        let active = self.is_showing(index);
        let page = self.pages.get_mut(index)?;
        let device = if active { Some(grid) } else { None };
        page.run(device, f)
    }

    fn is_showing(&self, index: usize) -> bool {
        index == self.current && !self.switching
    }

    /// Delivers `key` to the current page.
    fn forward_key(&mut self, grid: &mut dyn Grid, key: KeyEvent) {
        let active = self.is_showing(self.current);
        if let Some(page) = self.pages.get_mut(self.current) {
            let device = if active { Some(grid) } else { None };
            page.run(device, |app, view| app.grid_key(view, key));
        }
    }

    fn begin_switch(&mut self, grid: &mut dyn Grid) {
        for (x, y) in std::mem::take(&mut self.pressed) {
            debug!("releasing held key ({x}, {y}) before page switch");
            self.forward_key(&mut *grid, KeyEvent::release(x, y));
        }
        self.switching = true;
        self.render_chooser(grid);
    }

    fn end_switch(&mut self, grid: &mut dyn Grid) {
        self.switching = false;
        debug!("showing page {}", self.current);
        self.render_current(grid);
    }

    fn select(&mut self, grid: &mut dyn Grid, x: u32) {
        let index = x as usize;
        if index >= self.pages.len() {
            return;
        }
        if index != self.current {
            debug!("page {index} selected");
        }
        self.current = index;
        self.render_chooser(grid);
    }

    fn render_chooser(&self, grid: &mut dyn Grid) {
        let height = grid.height();
        grid.led_all(0);
        grid.led_row(0, height.saturating_sub(1), &vec![1; self.pages.len()]);
        grid.led_col(self.current as u32, 0, &vec![1; height as usize]);
    }

    /// Redraws the current page from its mirror, one 8×8 block at a time.
    fn render_current(&self, grid: &mut dyn Grid) {
        let Some(page) = self.pages.get(self.current) else {
            return;
        };
        let Some(buffer) = page.buffer.as_ref() else {
            return;
        };
        for y_offset in (0..buffer.height()).step_by(MAP_SIZE) {
            for x_offset in (0..buffer.width()).step_by(MAP_SIZE) {
                grid.led_map(x_offset, y_offset, &buffer.get_map(x_offset, y_offset));
            }
        }
        grid.led_intensity(page.intensity);
    }
}

impl GridApp for PageMultiplexer {
    fn ready(&mut self, grid: &mut dyn Grid) {
        let (width, height) = (grid.width(), grid.height());
        let button = self.corner.switch_button(width, height);
        self.switch_button = Some(button);
        debug!(
            "{} pages on {width}x{height}, switch button at {button:?}",
            self.pages.len()
        );
        for page in &mut self.pages {
            page.buffer = Some(BitBuffer::new(width, height));
        }
        for index in 0..self.pages.len() {
            let active = self.is_showing(index);
            let device = if active { Some(&mut *grid) } else { None };
            self.pages[index].run(device, |app, view| app.ready(view));
        }
    }

    fn grid_key(&mut self, grid: &mut dyn Grid, key: KeyEvent) {
        let Some(button) = self.switch_button else {
            debug!("dropping key {:?} received before ready", key.coords());
            return;
        };
        let (x, y) = key.coords();

        if (x, y) == button {
            if key.state.is_pressed() && !self.switching {
                self.begin_switch(grid);
            } else if !key.state.is_pressed() && self.switching {
                self.end_switch(grid);
            }
            return;
        }

        if self.switching {
            self.select(grid, x);
            return;
        }

        if key.state.is_pressed() {
            self.pressed.insert((x, y));
        } else {
            self.pressed.remove(&(x, y));
        }
        self.forward_key(grid, key);
    }

    fn tilt(&mut self, grid: &mut dyn Grid, tilt: TiltEvent) {
        if self.switching {
            return;
        }
        let current = self.current;
        if let Some(page) = self.pages.get_mut(current) {
            page.run(Some(grid), |app, view| app.tilt(view, tilt));
        }
    }

    fn disconnect(&mut self) {
        for page in &mut self.pages {
            page.app.disconnect();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::grid_client::GridClient;
    use crate::infrastructure::transport::mock::RecordingSink;
    use gridosc_core::{InboundMessage, OutboundMessage};
    use std::sync::{Arc, Mutex};

    /// What a recording page application observed.
    #[derive(Default)]
    struct Observed {
        ready: usize,
        keys: Vec<KeyEvent>,
        tilts: Vec<TiltEvent>,
        disconnects: usize,
    }

    /// Records events and echoes each key onto its own LED, so tests can see
    /// which writes reached the device.
    struct EchoApp {
        observed: Arc<Mutex<Observed>>,
    }

    impl GridApp for EchoApp {
        fn ready(&mut self, _grid: &mut dyn Grid) {
            self.observed.lock().unwrap().ready += 1;
        }

        fn grid_key(&mut self, grid: &mut dyn Grid, key: KeyEvent) {
            let (x, y) = key.coords();
            grid.led_set(x, y, key.state.as_int() as u8);
            self.observed.lock().unwrap().keys.push(key);
        }

        fn tilt(&mut self, _grid: &mut dyn Grid, tilt: TiltEvent) {
            self.observed.lock().unwrap().tilts.push(tilt);
        }

        fn disconnect(&mut self) {
            self.observed.lock().unwrap().disconnects += 1;
        }
    }

    fn echo_pages(n: usize) -> (Vec<Box<dyn GridApp + Send>>, Vec<Arc<Mutex<Observed>>>) {
        let observed: Vec<_> = (0..n).map(|_| Arc::new(Mutex::new(Observed::default()))).collect();
        let apps = observed
            .iter()
            .map(|o| {
                Box::new(EchoApp {
                    observed: Arc::clone(o),
                }) as Box<dyn GridApp + Send>
            })
            .collect();
        (apps, observed)
    }

    /// A client that has completed its handshake for a `width × height`
    /// device, with the handshake traffic already cleared from the sink.
    fn ready_client(width: u32, height: u32) -> (GridClient, RecordingSink) {
        let sink = RecordingSink::new();
        let mut client = GridClient::new("test", "127.0.0.1:9000".parse().unwrap(), Box::new(sink.clone()));
        client.apply_sys(&InboundMessage::SysId("m1".into()));
        client.apply_sys(&InboundMessage::SysSize { width, height });
        client.apply_sys(&InboundMessage::SysRotation(0));
        sink.take();
        (client, sink)
    }

    fn ready_mux(pages: usize) -> (PageMultiplexer, GridClient, RecordingSink, Vec<Arc<Mutex<Observed>>>) {
        let (apps, observed) = echo_pages(pages);
        let mut mux = PageMultiplexer::new(apps, PageCorner::TopRight);
        let (mut client, sink) = ready_client(16, 8);
        mux.ready(&mut client);
        sink.take();
        (mux, client, sink, observed)
    }

    // ── Page mirroring ────────────────────────────────────────────────────────

    #[test]
    fn test_ready_allocates_buffers_and_readies_every_page() {
        let (mux, _client, _sink, observed) = ready_mux(3);
        assert_eq!(mux.switch_button(), Some((15, 0)));
        for (i, o) in observed.iter().enumerate() {
            assert_eq!(o.lock().unwrap().ready, 1);
            let buffer = mux.page_buffer(i).unwrap();
            assert_eq!((buffer.width(), buffer.height()), (16, 8));
        }
    }

    #[test]
    fn test_active_page_writes_reach_device_and_mirror() {
        // Arrange
        let (mut mux, mut client, sink, _observed) = ready_mux(2);

        // Act
        mux.with_page(0, &mut client, |_app, grid| {
            grid.led_set(1, 2, 1);
            grid.led_row(0, 5, &[1, 1]);
        });

        // Assert
        assert_eq!(
            sink.messages(),
            vec![
                OutboundMessage::LedSet { x: 1, y: 2, s: 1 },
                OutboundMessage::LedRow {
                    x_offset: 0,
                    y: 5,
                    data: vec![1, 1]
                },
            ]
        );
        let buffer = mux.page_buffer(0).unwrap();
        assert_eq!(buffer.get(1, 2), Some(1));
        assert_eq!(buffer.get(1, 5), Some(1));
    }

    #[test]
    fn test_inactive_page_mirrors_without_touching_device() {
        // Arrange
        let (mut mux, mut client, sink, _observed) = ready_mux(2);
        let mut reference = BitBuffer::new(16, 8);

        // Act: the same sequence on page 1 and on a bare buffer.
        mux.with_page(1, &mut client, |_app, grid| {
            grid.led_all(1);
            grid.led_set(3, 3, 0);
            grid.led_col(9, 2, &[0, 0, 0]);
            grid.led_intensity(4);
        });
        reference.led_all(1);
        reference.led_set(3, 3, 0);
        reference.led_col(9, 2, &[0, 0, 0]);

        // Assert
        assert!(sink.messages().is_empty());
        assert_eq!(mux.page_buffer(1), Some(&reference));
        assert_eq!(mux.page_intensity(1), Some(4));
    }

    #[test]
    fn test_level_writes_only_forwarded_when_active() {
        let (mut mux, mut client, sink, _observed) = ready_mux(2);
        mux.with_page(1, &mut client, |_app, grid| grid.led_level_set(0, 0, 9));
        assert!(sink.messages().is_empty());
        mux.with_page(0, &mut client, |_app, grid| grid.led_level_set(0, 0, 9));
        assert_eq!(
            sink.messages(),
            vec![OutboundMessage::LevelSet { x: 0, y: 0, level: 9 }]
        );
    }

    #[test]
    fn test_with_page_before_ready_or_out_of_range_is_none() {
        let (apps, _observed) = echo_pages(1);
        let mut mux = PageMultiplexer::new(apps, PageCorner::TopLeft);
        let (mut client, _sink) = ready_client(8, 8);
        assert!(mux.with_page(0, &mut client, |_, _| ()).is_none());
        mux.ready(&mut client);
        assert!(mux.with_page(5, &mut client, |_, _| ()).is_none());
        assert!(mux.with_page(0, &mut client, |_, _| ()).is_some());
    }

    // ── Idle key handling ─────────────────────────────────────────────────────

    #[test]
    fn test_idle_keys_are_tracked_and_forwarded() {
        // Arrange
        let (mut mux, mut client, _sink, observed) = ready_mux(2);

        // Act
        mux.grid_key(&mut client, KeyEvent::press(2, 3));
        mux.grid_key(&mut client, KeyEvent::press(5, 1));
        mux.grid_key(&mut client, KeyEvent::release(2, 3));

        // Assert
        assert_eq!(mux.pressed().collect::<Vec<_>>(), vec![(5, 1)]);
        assert_eq!(observed[0].lock().unwrap().keys.len(), 3);
        assert!(observed[1].lock().unwrap().keys.is_empty());
    }

    #[test]
    fn test_idle_release_of_unpressed_key_is_a_noop_removal() {
        let (mut mux, mut client, _sink, observed) = ready_mux(1);
        mux.grid_key(&mut client, KeyEvent::release(4, 4));
        assert_eq!(mux.pressed().count(), 0);
        assert_eq!(observed[0].lock().unwrap().keys, vec![KeyEvent::release(4, 4)]);
    }

    #[test]
    fn test_keys_before_ready_are_dropped() {
        let (apps, observed) = echo_pages(1);
        let mut mux = PageMultiplexer::new(apps, PageCorner::TopRight);
        let (mut client, sink) = ready_client(16, 8);
        mux.grid_key(&mut client, KeyEvent::press(0, 0));
        assert!(observed[0].lock().unwrap().keys.is_empty());
        assert!(sink.messages().is_empty());
    }

    // ── Switching ─────────────────────────────────────────────────────────────

    #[test]
    fn test_switch_press_flushes_held_keys_before_chooser() {
        // Arrange
        let (mut mux, mut client, sink, observed) = ready_mux(3);
        mux.grid_key(&mut client, KeyEvent::press(2, 3));
        mux.grid_key(&mut client, KeyEvent::press(5, 1));
        sink.take();

        // Act
        mux.grid_key(&mut client, KeyEvent::press(15, 0));

        // Assert: the page saw exactly the two synthesized releases.
        let keys = observed[0].lock().unwrap().keys.clone();
        let released: BTreeSet<_> = keys[2..].iter().map(|k| k.coords()).collect();
        assert_eq!(keys.len(), 4);
        assert!(keys[2..].iter().all(|k| !k.state.is_pressed()));
        assert_eq!(released, BTreeSet::from([(2, 3), (5, 1)]));

        // The echoed releases hit the device before the chooser cleared it.
        let sent = sink.messages();
        let clear = sent.iter().position(|m| *m == OutboundMessage::LedAll(0)).unwrap();
        assert_eq!(clear, 2);
        assert!(sent[..2]
            .iter()
            .all(|m| matches!(m, OutboundMessage::LedSet { s: 0, .. })));
        assert!(mux.is_switching());
        assert_eq!(mux.pressed().count(), 0);
    }

    #[test]
    fn test_chooser_overlay_shows_page_count_and_selection() {
        // Arrange
        let (mut mux, mut client, sink, _observed) = ready_mux(3);

        // Act
        mux.grid_key(&mut client, KeyEvent::press(15, 0));

        // Assert
        assert_eq!(
            sink.messages(),
            vec![
                OutboundMessage::LedAll(0),
                OutboundMessage::LedRow {
                    x_offset: 0,
                    y: 7,
                    data: vec![1, 1, 1]
                },
                OutboundMessage::LedCol {
                    x: 0,
                    y_offset: 0,
                    data: vec![1; 8]
                },
            ]
        );
    }

    #[test]
    fn test_switch_button_is_never_tracked_as_pressed() {
        let (mut mux, mut client, _sink, observed) = ready_mux(1);
        mux.grid_key(&mut client, KeyEvent::press(15, 0));
        mux.grid_key(&mut client, KeyEvent::release(15, 0));
        assert_eq!(mux.pressed().count(), 0);
        assert!(observed[0].lock().unwrap().keys.is_empty());
    }

    #[test]
    fn test_keys_while_switching_are_consumed() {
        // Arrange
        let (mut mux, mut client, _sink, observed) = ready_mux(2);
        mux.grid_key(&mut client, KeyEvent::press(15, 0));

        // Act: column 9 is not a page, column 1 is.
        mux.grid_key(&mut client, KeyEvent::press(9, 4));
        mux.grid_key(&mut client, KeyEvent::press(1, 4));

        // Assert
        assert_eq!(mux.current_page(), 1);
        assert!(observed.iter().all(|o| o.lock().unwrap().keys.is_empty()));
        assert_eq!(mux.pressed().count(), 0);
    }

    #[test]
    fn test_selection_persists_and_page_is_redrawn_from_mirror() {
        // Arrange: page 2 draws in the background.
        let (mut mux, mut client, sink, _observed) = ready_mux(3);
        mux.with_page(2, &mut client, |_app, grid| {
            grid.led_set(0, 0, 1);
            grid.led_set(12, 7, 1);
            grid.led_intensity(6);
        });

        // Act
        mux.grid_key(&mut client, KeyEvent::press(15, 0));
        mux.grid_key(&mut client, KeyEvent::press(2, 0));
        sink.take();
        mux.grid_key(&mut client, KeyEvent::release(15, 0));

        // Assert
        assert_eq!(mux.current_page(), 2);
        assert!(!mux.is_switching());
        let buffer = mux.page_buffer(2).unwrap();
        assert_eq!(
            sink.messages(),
            vec![
                OutboundMessage::LedMap {
                    x_offset: 0,
                    y_offset: 0,
                    rows: buffer.get_map(0, 0)
                },
                OutboundMessage::LedMap {
                    x_offset: 8,
                    y_offset: 0,
                    rows: buffer.get_map(8, 0)
                },
                OutboundMessage::LedIntensity(6),
            ]
        );
    }

    #[test]
    fn test_redraw_tiles_whole_device() {
        // Arrange
        let (apps, _observed) = echo_pages(1);
        let mut mux = PageMultiplexer::new(apps, PageCorner::BottomLeft);
        let (mut client, sink) = ready_client(16, 16);
        mux.ready(&mut client);
        mux.grid_key(&mut client, KeyEvent::press(0, 15));
        sink.take();

        // Act
        mux.grid_key(&mut client, KeyEvent::release(0, 15));

        // Assert
        let offsets: Vec<(u32, u32)> = sink
            .messages()
            .into_iter()
            .filter_map(|m| match m {
                OutboundMessage::LedMap {
                    x_offset, y_offset, ..
                } => Some((x_offset, y_offset)),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![(0, 0), (8, 0), (0, 8), (8, 8)]);
    }

    #[test]
    fn test_inactive_page_keeps_drawing_while_other_is_shown() {
        // Arrange: switch to page 1.
        let (mut mux, mut client, sink, _observed) = ready_mux(2);
        mux.grid_key(&mut client, KeyEvent::press(15, 0));
        mux.grid_key(&mut client, KeyEvent::press(1, 0));
        mux.grid_key(&mut client, KeyEvent::release(15, 0));
        sink.take();

        // Act: page 0 is now in the background.
        mux.with_page(0, &mut client, |_app, grid| grid.led_set(4, 4, 1));

        // Assert
        assert!(sink.messages().is_empty());
        assert_eq!(mux.page_buffer(0).unwrap().get(4, 4), Some(1));
    }

    #[test]
    fn test_page_writes_during_switch_are_mirrored_only() {
        let (mut mux, mut client, sink, _observed) = ready_mux(2);
        mux.grid_key(&mut client, KeyEvent::press(15, 0));
        sink.take();
        mux.with_page(0, &mut client, |_app, grid| grid.led_set(1, 1, 1));
        assert!(sink.messages().is_empty());
        assert_eq!(mux.page_buffer(0).unwrap().get(1, 1), Some(1));
    }

    // ── Tilt and disconnect ───────────────────────────────────────────────────

    #[test]
    fn test_tilt_goes_to_current_page_only_while_idle() {
        // Arrange
        let (mut mux, mut client, _sink, observed) = ready_mux(2);
        let tilt = TiltEvent {
            sensor: 0,
            x: 10,
            y: 20,
            z: 30,
        };

        // Act
        mux.tilt(&mut client, tilt);
        mux.grid_key(&mut client, KeyEvent::press(15, 0));
        mux.tilt(&mut client, tilt);

        // Assert
        assert_eq!(observed[0].lock().unwrap().tilts, vec![tilt]);
        assert!(observed[1].lock().unwrap().tilts.is_empty());
    }

    #[test]
    fn test_disconnect_reaches_every_page() {
        let (mut mux, _client, _sink, observed) = ready_mux(3);
        mux.disconnect();
        assert!(observed.iter().all(|o| o.lock().unwrap().disconnects == 1));
    }
}
