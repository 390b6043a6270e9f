//! Resumable frame transfer engine
//!
//! Streams the front surface to the panel across many short calls so the
//! caller's loop never blocks on the bus.
//!
//! # Caller contract
//!
//! ```text
//! loop {
//!     if pacer.poll(now_us, engine.idle()) {
//!         draw into engine.back_buffer_mut()
//!         engine.flip()
//!     }
//!     engine.begin_epoch(now_ms)?     // scan until a dirty row is pushed
//!     ... other non-blocking work while DMA runs ...
//!     engine.complete_epoch(now_ms)?  // release the bus, advance one row
//! }
//! ```
//!
//! # States
//!
//! - `Idle`: the row budget of the last `flip()` is spent
//! - `Scanning`: rows are owed, no transaction open
//! - `TransactionOpen`: a dirty row was pushed and awaits `complete_epoch()`
//!
//! `begin_epoch()` only suspends right after pushing a dirty row's runs,
//! with the cursor still on that row. `complete_epoch()` closes the
//! transaction and advances exactly one row.

use rowcast_hal::PanelBus;

use super::scanner::DirtyRunScanner;
use crate::config::{ConfigError, PanelConfig};
use crate::palette::PIXELS_PER_BYTE;
use crate::surface::{BufferSet, IndexedBitmap, Phase};
use crate::timing::FrameRateObserver;

/// Transfer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferState {
    /// No rows owed
    Idle,
    /// Rows owed, bus released
    Scanning,
    /// Bus claimed, waiting for `complete_epoch()`
    TransactionOpen,
}

/// Scan position and remaining row budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanCursor {
    /// Next row to examine; wraps modulo height
    pub y: u16,
    /// Rows still owed in the current epoch
    pub remaining: u16,
}

/// Incremental transfer engine
///
/// `CAP` is the byte capacity of each of the three surfaces, `LINE` the
/// pixel capacity of the decode scratch line. Both are checked against the
/// requested geometry at construction.
pub struct FrameEngine<B, const CAP: usize, const LINE: usize> {
    bus: B,
    buffers: BufferSet<CAP>,
    scanner: DirtyRunScanner<LINE>,
    phase: Phase,
    cursor: ScanCursor,
    state: TransferState,
    /// Treat every byte as changed until the first wraparound
    force_full_redraw: bool,
    frame_rate: FrameRateObserver,
}

impl<B, const CAP: usize, const LINE: usize> FrameEngine<B, CAP, LINE>
where
    B: PanelBus,
{
    /// Engine with zero-sized surfaces, usable in `const` and `static`
    /// contexts
    ///
    /// Nothing is transmitted until [`init`](Self::init) sets a geometry.
    /// Large surfaces should be placed in static memory this way rather
    /// than built on the stack by [`new`](Self::new).
    pub const fn empty(bus: B) -> Self {
        Self {
            bus,
            buffers: BufferSet::empty(),
            scanner: DirtyRunScanner::new(),
            phase: Phase::A,
            cursor: ScanCursor { y: 0, remaining: 0 },
            state: TransferState::Idle,
            force_full_redraw: true,
            frame_rate: FrameRateObserver::new(0),
        }
    }

    /// Create an engine for a `width` x `height` surface
    ///
    /// All surfaces start white, the first pass after the first `flip()`
    /// repaints every pixel, and the frame-rate window starts at `now_ms`.
    pub fn new(bus: B, width: u16, height: u16, now_ms: u64) -> Result<Self, ConfigError> {
        let mut engine = Self::empty(bus);
        engine.init(width, height, now_ms)?;
        Ok(engine)
    }

    /// (Re)initialize in place for a `width` x `height` surface
    ///
    /// Same starting state as [`new`](Self::new). Any open transaction is
    /// abandoned without closing it; on error nothing is changed.
    pub fn init(&mut self, width: u16, height: u16, now_ms: u64) -> Result<(), ConfigError> {
        IndexedBitmap::<CAP>::check(width, height)?;
        let stride = IndexedBitmap::<CAP>::stride_for(width);
        if stride * PIXELS_PER_BYTE > LINE {
            return Err(ConfigError::LineBufferTooSmall);
        }
        self.buffers.reset(width, height)?;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "frame engine: {}x{}, stride {} bytes, {} of {} bytes per surface",
            width,
            height,
            stride,
            stride * height as usize,
            CAP
        );

        self.phase = Phase::A;
        self.cursor = ScanCursor { y: 0, remaining: 0 };
        self.state = TransferState::Idle;
        self.force_full_redraw = true;
        self.frame_rate = FrameRateObserver::new(now_ms);
        Ok(())
    }

    /// Create an engine from a validated panel configuration
    pub fn with_config(bus: B, config: &PanelConfig, now_ms: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::new(bus, config.width, config.height, now_ms)
    }

    pub fn width(&self) -> u16 {
        self.buffers.shadow().width()
    }

    pub fn height(&self) -> u16 {
        self.buffers.shadow().height()
    }

    /// Surface the caller draws the next frame into
    pub fn back_buffer(&self) -> &IndexedBitmap<CAP> {
        self.buffers.back(self.phase)
    }

    pub fn back_buffer_mut(&mut self) -> &mut IndexedBitmap<CAP> {
        self.buffers.back_mut(self.phase)
    }

    /// Surface being transmitted
    pub fn front_buffer(&self) -> &IndexedBitmap<CAP> {
        self.buffers.front(self.phase)
    }

    /// Content the panel is known to show
    pub fn shadow_buffer(&self) -> &IndexedBitmap<CAP> {
        self.buffers.shadow()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cursor(&self) -> ScanCursor {
        self.cursor
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    /// True until the cold-start full repaint has wrapped around
    pub fn full_redraw_pending(&self) -> bool {
        self.force_full_redraw
    }

    /// No rows owed; the caller may `flip()` without backlog
    pub fn idle(&self) -> bool {
        self.state == TransferState::Idle
    }

    pub fn frame_rate(&self) -> &FrameRateObserver {
        &self.frame_rate
    }

    /// Full passes per second over the last sampling window
    pub fn fps(&self) -> f32 {
        self.frame_rate.fps()
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Give back the panel bus
    pub fn release(self) -> B {
        self.bus
    }

    /// Draw the frame-rate label into the back buffer
    ///
    /// Call after rendering and before `flip()` to overlay it on the frame.
    pub fn paint_fps(&mut self) {
        let back = self.buffers.back_mut(self.phase);
        self.frame_rate.paint_fps(back).unwrap_or_else(|never| match never {});
    }

    /// Swap back and front and start a new epoch of `height` rows
    ///
    /// From idle the sweep restarts at row 0. With a backlog the cursor is
    /// left where the previous epoch stopped, so rows are shown late but
    /// never skipped. The budget is always exactly `height`; leftover rows
    /// are not carried over.
    pub fn flip(&mut self) {
        let was_idle = self.idle();
        self.phase = self.phase.flipped();
        self.cursor.remaining = self.height();
        if was_idle {
            self.cursor.y = 0;
            // An engine without surfaces owes no rows
            if self.cursor.remaining > 0 {
                self.state = TransferState::Scanning;
            }
        }
    }

    /// Scan forward until a dirty row has been pushed or the budget is spent
    ///
    /// Clean rows are consumed in the same call. When a row has runs, the
    /// transaction is opened (if needed), every run of that row is pushed and
    /// the call returns with the cursor still on the row.
    pub fn begin_epoch(&mut self, now_ms: u64) -> Result<(), B::Error> {
        if self.idle() {
            return Ok(());
        }

        loop {
            let Self {
                bus,
                buffers,
                scanner,
                phase,
                cursor,
                state,
                force_full_redraw,
                ..
            } = &mut *self;
            let (front, shadow) = buffers.front_and_shadow_mut(*phase);

            scanner.sync_row(cursor.y, front, shadow, *force_full_redraw, |run, pixels| {
                if *state != TransferState::TransactionOpen {
                    bus.open_transaction()?;
                    *state = TransferState::TransactionOpen;
                }
                bus.push_run(run.row, run.start, run.count, pixels)
            })?;

            if *state == TransferState::TransactionOpen {
                return Ok(());
            }

            self.advance(now_ms);
            if self.idle() {
                return Ok(());
            }
        }
    }

    /// Release the bus if a transaction is open, then advance one row
    pub fn complete_epoch(&mut self, now_ms: u64) -> Result<(), B::Error> {
        if self.idle() {
            return Ok(());
        }

        if self.state == TransferState::TransactionOpen {
            self.bus.close_transaction()?;
            self.state = TransferState::Scanning;
        }

        self.advance(now_ms);
        Ok(())
    }

    /// One `begin_epoch` / `complete_epoch` pair with `between` run in the
    /// gap, where the caller can draw into the back buffer while the pushed
    /// runs are still in flight
    pub fn service<F>(&mut self, now_ms: u64, between: F) -> Result<(), B::Error>
    where
        F: FnOnce(&mut IndexedBitmap<CAP>),
    {
        self.begin_epoch(now_ms)?;
        between(self.back_buffer_mut());
        self.complete_epoch(now_ms)
    }

    /// Drive begin/complete pairs until idle
    ///
    /// Blocking convenience for start-up and tests; a running system calls
    /// the pair from its main loop instead.
    pub fn drain(&mut self, now_ms: u64) -> Result<(), B::Error> {
        while !self.idle() {
            self.begin_epoch(now_ms)?;
            self.complete_epoch(now_ms)?;
        }
        Ok(())
    }

    fn advance(&mut self, now_ms: u64) {
        self.cursor.remaining = self.cursor.remaining.saturating_sub(1);

        if self.cursor.y + 1 < self.height() {
            self.cursor.y += 1;
        } else {
            self.cursor.y = 0;
            if self.force_full_redraw {
                self.force_full_redraw = false;

                #[cfg(feature = "defmt")]
                defmt::debug!("cold-start repaint complete");
            }
            self.frame_rate.record_pass(now_ms);
        }

        if self.cursor.remaining == 0 {
            self.state = TransferState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PaletteColor;
    use heapless::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Op {
        Open,
        Push { row: u16, start: u16, count: u16 },
        Close,
    }

    /// Mock panel bus recording every call
    struct MockBus {
        ops: Vec<Op, 256>,
        pixels: Vec<u16, 256>,
        open: bool,
        fail_push: bool,
    }

    impl MockBus {
        fn new() -> Self {
            Self {
                ops: Vec::new(),
                pixels: Vec::new(),
                open: false,
                fail_push: false,
            }
        }

        fn pushes(&self) -> impl Iterator<Item = &Op> {
            self.ops.iter().filter(|op| matches!(op, Op::Push { .. }))
        }
    }

    #[derive(Debug, PartialEq)]
    struct BusFault;

    impl PanelBus for MockBus {
        type Error = BusFault;

        fn open_transaction(&mut self) -> Result<(), BusFault> {
            assert!(!self.open, "transaction opened twice");
            self.open = true;
            self.ops.push(Op::Open).map_err(|_| BusFault)
        }

        fn push_run(&mut self, row: u16, start: u16, count: u16, pixels: &[u16]) -> Result<(), BusFault> {
            assert!(self.open, "push outside transaction");
            if self.fail_push {
                return Err(BusFault);
            }
            assert_eq!(pixels.len(), count as usize);
            self.pixels.clear();
            self.pixels.extend_from_slice(pixels).map_err(|_| BusFault)?;
            self.ops
                .push(Op::Push { row, start, count })
                .map_err(|_| BusFault)
        }

        fn close_transaction(&mut self) -> Result<(), BusFault> {
            assert!(self.open, "close without open");
            self.open = false;
            self.ops.push(Op::Close).map_err(|_| BusFault)
        }
    }

    /// 8x4 surface, 2 bytes per row
    type Engine = FrameEngine<MockBus, 8, 8>;

    fn engine() -> Engine {
        Engine::new(MockBus::new(), 8, 4, 0).unwrap()
    }

    /// Finish the cold-start pass and forget its bus traffic
    fn warmed_up() -> Engine {
        let mut e = engine();
        e.flip();
        e.drain(0).unwrap();
        e.bus.ops.clear();
        e
    }

    #[test]
    fn test_starts_idle() {
        let mut e = engine();
        assert!(e.idle());
        assert!(e.full_redraw_pending());
        assert_eq!(e.phase(), Phase::A);

        // Idle calls are no-ops
        e.begin_epoch(0).unwrap();
        e.complete_epoch(0).unwrap();
        assert!(e.bus().ops.is_empty());
        assert_eq!(e.cursor(), ScanCursor { y: 0, remaining: 0 });
    }

    #[test]
    fn test_rejects_bad_geometry() {
        assert_eq!(
            Engine::new(MockBus::new(), 0, 4, 0).err(),
            Some(ConfigError::ZeroWidth)
        );
        assert_eq!(
            Engine::new(MockBus::new(), 8, 5, 0).err(),
            Some(ConfigError::SurfaceTooLarge)
        );
        assert_eq!(
            FrameEngine::<MockBus, 64, 8>::new(MockBus::new(), 12, 4, 0).err(),
            Some(ConfigError::LineBufferTooSmall)
        );
        let mut config = PanelConfig::new(8, 4, 0);
        config.target_fps = 0;
        assert_eq!(
            Engine::with_config(MockBus::new(), &config, 0).err(),
            Some(ConfigError::InvalidFrameRate)
        );
    }

    #[test]
    fn test_init_in_place() {
        let mut e = Engine::empty(MockBus::new());
        assert!(e.idle());
        assert_eq!(e.width(), 0);
        e.flip();
        e.drain(0).unwrap();
        assert!(e.bus().ops.is_empty());

        e.init(8, 4, 0).unwrap();
        e.flip();
        e.drain(0).unwrap();
        assert_eq!(e.bus().pushes().count(), 4);
        assert!(!e.full_redraw_pending());

        // Re-init an engine mid-epoch: back to a cold start
        e.back_buffer_mut().fill(PaletteColor::Black);
        e.flip();
        e.begin_epoch(0).unwrap();
        assert_eq!(e.state(), TransferState::TransactionOpen);
        // Board code resets the panel bus before re-initializing
        e.bus.open = false;
        e.init(4, 2, 500).unwrap();
        assert!(e.idle());
        assert!(e.full_redraw_pending());
        assert_eq!(e.phase(), Phase::A);
        assert_eq!(e.cursor(), ScanCursor { y: 0, remaining: 0 });
        assert_eq!(e.frame_rate().sample().window_start_ms, 500);
        assert_eq!((e.width(), e.height()), (4, 2));
        assert!(e.front_buffer().as_bytes().iter().all(|&b| b == 0xFF));

        assert_eq!(e.init(8, 5, 0), Err(ConfigError::SurfaceTooLarge));
        assert_eq!((e.width(), e.height()), (4, 2));
    }

    #[test]
    fn test_release_returns_bus() {
        let mut e = engine();
        e.flip();
        e.drain(0).unwrap();
        let bus = e.release();
        assert!(!bus.open);
        assert_eq!(bus.ops.len(), 12);
    }

    #[test]
    fn test_paint_fps_into_back_buffer() {
        let mut e = FrameEngine::<MockBus, 1024, 64>::new(MockBus::new(), 64, 24, 0).unwrap();
        e.paint_fps();
        assert!((4..46).any(|x| e.back_buffer().pixel(x, 8) == Some(PaletteColor::Black)));
        assert!(e.front_buffer().as_bytes().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_flip_swaps_surfaces() {
        let mut e = engine();
        e.back_buffer_mut().fill(PaletteColor::Black);
        e.flip();
        assert_eq!(e.phase(), Phase::B);
        assert!(e.front_buffer().as_bytes().iter().all(|&b| b == 0x00));
        assert!(e.back_buffer().as_bytes().iter().all(|&b| b == 0xFF));
        assert_eq!(e.cursor(), ScanCursor { y: 0, remaining: 4 });
        assert_eq!(e.state(), TransferState::Scanning);
    }

    #[test]
    fn test_cold_start_paints_every_row() {
        let mut e = engine();
        e.flip();

        for row in 0..4 {
            e.begin_epoch(0).unwrap();
            assert_eq!(e.state(), TransferState::TransactionOpen);
            assert_eq!(e.cursor().y, row);
            e.complete_epoch(0).unwrap();
        }
        assert!(e.idle());
        assert!(!e.full_redraw_pending());

        let expected = [
            Op::Open,
            Op::Push { row: 0, start: 0, count: 8 },
            Op::Close,
            Op::Open,
            Op::Push { row: 1, start: 0, count: 8 },
            Op::Close,
            Op::Open,
            Op::Push { row: 2, start: 0, count: 8 },
            Op::Close,
            Op::Open,
            Op::Push { row: 3, start: 0, count: 8 },
            Op::Close,
        ];
        assert_eq!(e.bus().ops.as_slice(), &expected);
    }

    #[test]
    fn test_single_dirty_row() {
        let mut e = warmed_up();
        // Make both render surfaces and the shadow black
        e.back_buffer_mut().fill(PaletteColor::Black);
        e.flip();
        e.drain(0).unwrap();
        e.back_buffer_mut().fill(PaletteColor::Black);
        e.flip();
        e.drain(0).unwrap();
        e.bus.ops.clear();

        e.back_buffer_mut().row_mut(2).copy_from_slice(&[0xFF, 0x00]);
        e.flip();

        // Rows 0 and 1 are clean and consumed in the first call
        e.begin_epoch(0).unwrap();
        assert_eq!(e.cursor(), ScanCursor { y: 2, remaining: 2 });
        assert_eq!(e.state(), TransferState::TransactionOpen);
        e.complete_epoch(0).unwrap();

        e.begin_epoch(0).unwrap();
        assert!(e.idle());

        assert_eq!(
            e.bus().ops.as_slice(),
            &[Op::Open, Op::Push { row: 2, start: 0, count: 4 }, Op::Close]
        );
        assert_eq!(e.bus().pixels.as_slice(), &[0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF]);
        assert_eq!(e.shadow_buffer().row(2), &[0xFF, 0x00]);
    }

    #[test]
    fn test_unchanged_frame_pushes_nothing() {
        let mut e = warmed_up();
        e.flip();
        e.begin_epoch(0).unwrap();
        assert!(e.idle());
        assert!(e.bus().ops.is_empty());
    }

    #[test]
    fn test_backlog_keeps_cursor() {
        let mut e = engine();
        e.flip();
        e.begin_epoch(0).unwrap();
        e.complete_epoch(0).unwrap();
        e.begin_epoch(0).unwrap();
        e.complete_epoch(0).unwrap();
        assert_eq!(e.cursor(), ScanCursor { y: 2, remaining: 2 });

        // Next frame arrives before the epoch drained
        e.flip();
        assert_eq!(e.cursor(), ScanCursor { y: 2, remaining: 4 });
        e.drain(0).unwrap();
        assert_eq!(e.cursor(), ScanCursor { y: 2, remaining: 0 });
    }

    #[test]
    fn test_flip_with_open_transaction() {
        let mut e = engine();
        e.flip();
        e.begin_epoch(0).unwrap();
        e.flip();
        assert_eq!(e.state(), TransferState::TransactionOpen);
        e.complete_epoch(0).unwrap();
        assert_eq!(e.state(), TransferState::Scanning);
        assert_eq!(e.cursor(), ScanCursor { y: 1, remaining: 3 });
    }

    #[test]
    fn test_service_runs_between() {
        let mut e = engine();
        e.flip();
        let mut called = false;
        e.service(0, |back| {
            called = true;
            back.set_pixel(0, 0, PaletteColor::Red);
        })
        .unwrap();
        assert!(called);
        assert_eq!(e.back_buffer().pixel(0, 0), Some(PaletteColor::Red));
        assert_eq!(e.cursor().y, 1);
        assert!(!e.bus().open);
    }

    #[test]
    fn test_push_failure_is_retried() {
        let mut e = engine();
        e.flip();
        e.bus.fail_push = true;
        assert_eq!(e.begin_epoch(0), Err(BusFault));
        assert_eq!(e.cursor().y, 0);

        e.bus.fail_push = false;
        e.begin_epoch(0).unwrap();
        e.complete_epoch(0).unwrap();
        assert_eq!(e.bus().pushes().count(), 1);
        assert_eq!(e.cursor().y, 1);
    }

    #[test]
    fn test_fps_counts_wraparounds() {
        let mut e = engine();
        for i in 1..=10u64 {
            e.flip();
            e.drain(i * 100).unwrap();
        }
        assert_eq!(e.fps(), 10.0);
        assert_eq!(e.frame_rate().label().as_str(), "FPS:10.0");
    }
}
