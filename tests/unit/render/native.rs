use std::collections::VecDeque;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::{Duration, SystemTime};

use super::*;
use crate::compositor::{Compositor, CompositorOpts};
use crate::foundation::core::{CellRect, Dimensions, PixelRect};
use crate::render::native::subwindow::Resources;
use crate::render::native::upload::RowBands;
use crate::scale::policy::ScalePolicy;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Call {
    CreateWindow(u32, PixelRect),
    CreatePixmap(u32, Dimensions),
    CreateGc(u32),
    PutImage { pixmap: u32, rows: Range<u32>, len: usize },
    CopyArea { pixmap: u32, window: u32, size: Dimensions },
    Move(u32, i32, i32),
    Map(u32),
    Unmap(u32),
    DestroyWindow(u32),
    FreePixmap(u32),
    FreeGc(u32),
    Flush,
    Sync,
}

impl Call {
    fn creates(&self) -> bool {
        matches!(
            self,
            Call::CreateWindow(..) | Call::CreatePixmap(..) | Call::CreateGc(..)
        )
    }
}

#[derive(Debug)]
struct RecordingServer {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicU32,
    max_upload: usize,
    increment: Option<Dimensions>,
    anchor_size: Dimensions,
    fail_pixmap: AtomicBool,
    fail_hints: AtomicBool,
    format_queries: AtomicU32,
    events: Mutex<VecDeque<ServerEvent>>,
}

impl Default for RecordingServer {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU32::new(100),
            max_upload: 1 << 20,
            increment: Some(Dimensions::new(10, 20)),
            anchor_size: Dimensions::new(800, 480),
            fail_pixmap: AtomicBool::new(false),
            fail_hints: AtomicBool::new(false),
            format_queries: AtomicU32::new(0),
            events: Mutex::new(VecDeque::new()),
        }
    }
}

impl RecordingServer {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn id(&self) -> u32 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }
}

impl DisplayServer for RecordingServer {
    fn screen_format(&self) -> TermlayerResult<ScreenFormat> {
        self.format_queries.fetch_add(1, Ordering::SeqCst);
        Ok(ScreenFormat {
            depth: 24,
            visual: 33,
        })
    }

    fn max_upload_bytes(&self) -> usize {
        self.max_upload
    }

    fn create_window(
        &self,
        _parent: WindowId,
        _format: ScreenFormat,
        rect: PixelRect,
    ) -> TermlayerResult<WindowId> {
        let id = self.id();
        self.record(Call::CreateWindow(id, rect));
        Ok(WindowId(id))
    }

    fn create_pixmap(
        &self,
        _format: ScreenFormat,
        _window: WindowId,
        size: Dimensions,
    ) -> TermlayerResult<PixmapId> {
        if self.fail_pixmap.load(Ordering::SeqCst) {
            return Err(TermlayerError::resource("pixmap allocation refused"));
        }
        let id = self.id();
        self.record(Call::CreatePixmap(id, size));
        Ok(PixmapId(id))
    }

    fn create_gc(&self, _pixmap: PixmapId) -> TermlayerResult<GcId> {
        let id = self.id();
        self.record(Call::CreateGc(id));
        Ok(GcId(id))
    }

    fn put_image(
        &self,
        pixmap: PixmapId,
        _gc: GcId,
        _depth: u8,
        _width: u32,
        rows: Range<u32>,
        data: &[u8],
    ) -> TermlayerResult<()> {
        self.record(Call::PutImage {
            pixmap: pixmap.0,
            rows,
            len: data.len(),
        });
        Ok(())
    }

    fn copy_area(
        &self,
        src: PixmapId,
        dst: WindowId,
        _gc: GcId,
        size: Dimensions,
    ) -> TermlayerResult<()> {
        self.record(Call::CopyArea {
            pixmap: src.0,
            window: dst.0,
            size,
        });
        Ok(())
    }

    fn move_window(&self, window: WindowId, x: i32, y: i32) -> TermlayerResult<()> {
        self.record(Call::Move(window.0, x, y));
        Ok(())
    }

    fn map_window(&self, window: WindowId) -> TermlayerResult<()> {
        self.record(Call::Map(window.0));
        Ok(())
    }

    fn unmap_window(&self, window: WindowId) -> TermlayerResult<()> {
        self.record(Call::Unmap(window.0));
        Ok(())
    }

    fn destroy_window(&self, window: WindowId) -> TermlayerResult<()> {
        self.record(Call::DestroyWindow(window.0));
        Ok(())
    }

    fn free_pixmap(&self, pixmap: PixmapId) -> TermlayerResult<()> {
        self.record(Call::FreePixmap(pixmap.0));
        Ok(())
    }

    fn free_gc(&self, gc: GcId) -> TermlayerResult<()> {
        self.record(Call::FreeGc(gc.0));
        Ok(())
    }

    fn window_size(&self, _window: WindowId) -> TermlayerResult<Dimensions> {
        Ok(self.anchor_size)
    }

    fn resize_increment(&self, _window: WindowId) -> TermlayerResult<Option<Dimensions>> {
        if self.fail_hints.load(Ordering::SeqCst) {
            return Err(TermlayerError::resource("query WM_NORMAL_HINTS: connection reset"));
        }
        Ok(self.increment)
    }

    fn flush(&self) -> TermlayerResult<()> {
        self.record(Call::Flush);
        Ok(())
    }

    fn sync(&self) -> TermlayerResult<()> {
        self.record(Call::Sync);
        Ok(())
    }

    fn next_event(&self, _block: bool) -> TermlayerResult<Option<ServerEvent>> {
        Ok(self.events.lock().unwrap().pop_front())
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "termlayer_native_{name}_{}_{}",
        std::process::id(),
        SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_png(path: &Path, w: u32, h: u32, rgba: [u8; 4]) {
    image::RgbaImage::from_pixel(w, h, image::Rgba(rgba))
        .save(path)
        .unwrap();
}

fn anchor() -> AnchorWindow {
    AnchorWindow(WindowId(7))
}

fn backend(server: RecordingServer) -> NativeBackend<RecordingServer> {
    NativeBackend::with_server(Arc::new(server), NativeBackendOpts::new(anchor()))
}

fn request<'a>(name: &'a str, path: &'a Path, rect: CellRect) -> DrawRequest<'a> {
    DrawRequest {
        name,
        rect,
        path,
        policy: ScalePolicy::ContainFit,
        scaling_position: (0.0, 0.0),
        visible: true,
        synchronous: false,
    }
}

fn rect(x: i32, y: i32, width: u32, height: u32) -> CellRect {
    CellRect {
        x,
        y,
        width,
        height,
    }
}

fn resources(b: &NativeBackend<RecordingServer>, name: &str) -> Resources {
    lock(&b.existing_slot(name).unwrap()).resources()
}

#[test]
fn first_draw_creates_uploads_maps_and_blits() {
    let dir = temp_dir("first");
    let path = dir.join("a.png");
    write_png(&path, 40, 20, [255, 0, 0, 255]);

    let b = backend(RecordingServer::default());
    b.issue(&request("a", &path, rect(1, 1, 8, 2))).unwrap();

    let calls = b.server().calls();
    assert_eq!(
        calls[0],
        Call::CreateWindow(
            100,
            PixelRect {
                x: 10,
                y: 20,
                width: 40,
                height: 20
            }
        )
    );
    assert_eq!(calls[1], Call::CreatePixmap(101, Dimensions::new(40, 20)));
    assert_eq!(calls[2], Call::CreateGc(102));
    assert_eq!(
        calls[3],
        Call::PutImage {
            pixmap: 101,
            rows: 0..20,
            len: 40 * 20 * 4
        }
    );
    assert_eq!(
        &calls[4..],
        &[
            Call::Map(100),
            Call::Flush,
            Call::CopyArea {
                pixmap: 101,
                window: 100,
                size: Dimensions::new(40, 20)
            },
            Call::Flush,
        ]
    );
    assert!(matches!(
        resources(&b, "a"),
        Resources::Created(m) if m.mapped
    ));
}

#[test]
fn identical_issue_is_idempotent() {
    let dir = temp_dir("idem");
    let path = dir.join("a.png");
    write_png(&path, 40, 20, [0, 255, 0, 255]);

    let b = backend(RecordingServer::default());
    let req = request("a", &path, rect(0, 0, 8, 2));
    b.issue(&req).unwrap();
    let before = resources(&b, "a");
    b.server().take();

    b.issue(&req).unwrap();
    assert!(b.server().calls().is_empty());
    assert_eq!(resources(&b, "a"), before);
}

#[test]
fn chunked_upload_tiles_every_row_once() {
    let dir = temp_dir("chunk");
    let path = dir.join("a.png");
    write_png(&path, 10, 7, [1, 2, 3, 255]);

    // 10x7 fits the 10x20 px box unscaled; 125 bytes hold three 40-byte rows.
    let b = backend(RecordingServer {
        max_upload: 10 * 4 * 3 + 5,
        ..RecordingServer::default()
    });
    b.issue(&request("a", &path, rect(0, 0, 1, 1))).unwrap();

    let bands: Vec<Range<u32>> = b
        .server()
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::PutImage { rows, len, .. } => {
                assert!(len <= 10 * 4 * 3 + 5);
                assert_eq!(len, (rows.end - rows.start) as usize * 40);
                Some(rows)
            }
            _ => None,
        })
        .collect();
    assert_eq!(bands, vec![0..3, 3..6, 6..7]);
}

#[test]
fn row_bands_cover_height_without_gap_or_overlap() {
    for (height, stride, max) in [(1, 4, 4), (100, 4000, 9000), (37, 12, 1000), (5, 8, 1 << 20)] {
        let bands: Vec<Range<u32>> = RowBands::new(height, stride, max).unwrap().collect();
        let mut next = 0;
        for band in &bands {
            assert_eq!(band.start, next);
            assert!(band.end > band.start);
            assert!((band.end - band.start) as usize * stride <= max);
            next = band.end;
        }
        assert_eq!(next, height);
    }
}

#[test]
fn row_wider_than_transfer_limit_is_a_resource_error() {
    let err = RowBands::new(3, 400, 100).unwrap_err();
    assert!(matches!(err, TermlayerError::Resource(_)));
    assert_eq!(RowBands::new(3, 0, 100).unwrap().count(), 0);
}

#[test]
fn visibility_change_only_maps_and_unmaps() {
    let dir = temp_dir("vis");
    let path = dir.join("a.png");
    write_png(&path, 40, 20, [9, 9, 9, 255]);

    let b = backend(RecordingServer::default());
    let mut req = request("a", &path, rect(0, 0, 8, 2));
    b.issue(&req).unwrap();
    b.server().take();

    req.visible = false;
    b.issue(&req).unwrap();
    assert_eq!(b.server().take(), vec![Call::Unmap(100), Call::Flush]);

    b.issue(&req).unwrap();
    assert!(b.server().take().is_empty());

    req.visible = true;
    b.issue(&req).unwrap();
    let calls = b.server().take();
    assert!(calls.iter().all(|c| !c.creates()));
    assert!(!calls.iter().any(|c| matches!(c, Call::PutImage { .. })));
    assert_eq!(calls[0], Call::Map(100));
    assert!(calls.contains(&Call::CopyArea {
        pixmap: 101,
        window: 100,
        size: Dimensions::new(40, 20)
    }));
}

#[test]
fn hiding_an_unknown_layer_makes_no_calls() {
    let b = backend(RecordingServer::default());
    let mut req = request("ghost", Path::new("/nonexistent.png"), rect(0, 0, 1, 1));
    req.visible = false;
    b.issue(&req).unwrap();
    assert!(b.server().calls().is_empty());
    assert!(b.layer_names().is_empty());
}

#[test]
fn expose_only_blits_mapped_windows() {
    let dir = temp_dir("expose");
    let path = dir.join("a.png");
    write_png(&path, 40, 20, [5, 6, 7, 255]);

    let b = backend(RecordingServer::default());
    b.issue(&request("a", &path, rect(0, 0, 8, 2))).unwrap();
    let mut hidden = request("b", &path, rect(0, 3, 8, 2));
    b.issue(&hidden).unwrap();
    hidden.visible = false;
    b.issue(&hidden).unwrap();
    b.server().take();

    b.server()
        .events
        .lock()
        .unwrap()
        .push_back(ServerEvent::Expose {
            window: WindowId(100),
        });
    assert_eq!(b.pump_events(false).unwrap(), 1);
    assert_eq!(
        b.server().take(),
        vec![
            Call::CopyArea {
                pixmap: 101,
                window: 100,
                size: Dimensions::new(40, 20)
            },
            Call::Flush
        ]
    );

    b.server()
        .events
        .lock()
        .unwrap()
        .push_back(ServerEvent::Other);
    assert_eq!(b.pump_events(false).unwrap(), 0);
    assert_eq!(b.pump_events(false).unwrap(), 0);
    assert!(b.server().calls().is_empty());
}

#[test]
fn position_only_change_moves_existing_window() {
    let dir = temp_dir("move");
    let path = dir.join("a.png");
    write_png(&path, 40, 20, [1, 1, 1, 255]);

    let b = backend(RecordingServer::default());
    b.issue(&request("a", &path, rect(0, 0, 8, 2))).unwrap();
    b.server().take();

    b.issue(&request("a", &path, rect(2, 3, 8, 2))).unwrap();
    let calls = b.server().take();
    assert_eq!(calls[0], Call::Move(100, 20, 60));
    assert!(calls.iter().all(|c| !c.creates()));
    assert!(!calls.iter().any(|c| matches!(c, Call::PutImage { .. })));
}

#[test]
fn resolved_size_change_recreates_resources() {
    let dir = temp_dir("resize");
    let path = dir.join("a.png");
    write_png(&path, 40, 20, [1, 1, 1, 255]);

    let b = backend(RecordingServer::default());
    b.issue(&request("a", &path, rect(0, 0, 8, 2))).unwrap();
    b.server().take();

    // 2x1 cells = 20x20 px; contain shrinks 40x20 to 20x10.
    b.issue(&request("a", &path, rect(0, 0, 2, 1))).unwrap();
    let calls = b.server().take();
    assert_eq!(
        &calls[..3],
        &[
            Call::DestroyWindow(100),
            Call::FreePixmap(101),
            Call::FreeGc(102)
        ]
    );
    assert!(calls.contains(&Call::CreatePixmap(104, Dimensions::new(20, 10))));
    assert!(calls.contains(&Call::PutImage {
        pixmap: 104,
        rows: 0..10,
        len: 20 * 10 * 4
    }));
}

#[test]
fn content_change_at_same_size_reuploads_in_place() {
    let dir = temp_dir("content");
    let path = dir.join("a.png");
    write_png(&path, 40, 20, [1, 1, 1, 255]);
    let old = SystemTime::now() - Duration::from_secs(60);
    std::fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(old)
        .unwrap();

    let b = backend(RecordingServer::default());
    let req = request("a", &path, rect(0, 0, 8, 2));
    b.issue(&req).unwrap();
    b.server().take();

    write_png(&path, 40, 20, [200, 1, 1, 255]);
    b.issue(&req).unwrap();
    let calls = b.server().take();
    assert!(calls.iter().all(|c| !c.creates()));
    assert_eq!(
        calls[0],
        Call::PutImage {
            pixmap: 101,
            rows: 0..20,
            len: 40 * 20 * 4
        }
    );
}

#[test]
fn degenerate_box_is_not_renderable() {
    let dir = temp_dir("degenerate");
    let path = dir.join("a.png");
    write_png(&path, 4, 4, [1, 1, 1, 255]);

    let b = backend(RecordingServer::default());
    b.issue(&request("a", &path, rect(0, 0, 0, 3))).unwrap();
    assert!(b.server().calls().iter().all(|c| !c.creates()));
    assert_eq!(resources(&b, "a"), Resources::Absent);
}

#[test]
fn synchronous_draw_ends_with_sync() {
    let dir = temp_dir("sync");
    let path = dir.join("a.png");
    write_png(&path, 4, 4, [1, 1, 1, 255]);

    let b = backend(RecordingServer::default());
    let mut req = request("a", &path, rect(0, 0, 1, 1));
    req.synchronous = true;
    b.issue(&req).unwrap();
    assert_eq!(b.server().calls().last(), Some(&Call::Sync));
}

#[test]
fn creation_failure_is_normalized_to_absent() {
    let dir = temp_dir("fail");
    let path = dir.join("a.png");
    write_png(&path, 40, 20, [1, 1, 1, 255]);

    let b = backend(RecordingServer::default());
    b.server().fail_pixmap.store(true, Ordering::SeqCst);
    let req = request("a", &path, rect(0, 0, 8, 2));
    let err = b.issue(&req).unwrap_err();
    assert!(matches!(err, TermlayerError::Resource(_)));
    assert!(b.server().calls().contains(&Call::DestroyWindow(100)));
    assert_eq!(resources(&b, "a"), Resources::Absent);

    b.server().fail_pixmap.store(false, Ordering::SeqCst);
    b.server().take();
    b.issue(&req).unwrap();
    assert!(b.server().calls().iter().filter(|c| c.creates()).count() == 3);
}

#[test]
fn missing_or_directory_source_is_a_content_error() {
    let dir = temp_dir("missing");
    let b = backend(RecordingServer::default());

    let missing = dir.join("nope.png");
    let err = b.issue(&request("a", &missing, rect(0, 0, 2, 2))).unwrap_err();
    assert!(matches!(err, TermlayerError::Content(_)));

    let err = b.issue(&request("a", &dir, rect(0, 0, 2, 2))).unwrap_err();
    assert!(matches!(err, TermlayerError::Content(_)));
    assert!(b.server().calls().is_empty());
}

#[test]
fn retract_and_shutdown_release_everything() {
    let dir = temp_dir("retract");
    let path = dir.join("a.png");
    write_png(&path, 4, 4, [1, 1, 1, 255]);

    let b = backend(RecordingServer::default());
    b.issue(&request("a", &path, rect(0, 0, 1, 1))).unwrap();
    b.issue(&request("b", &path, rect(2, 0, 1, 1))).unwrap();
    b.server().take();

    b.retract("a").unwrap();
    assert_eq!(
        b.server().take(),
        vec![
            Call::DestroyWindow(100),
            Call::FreePixmap(101),
            Call::FreeGc(102),
            Call::Flush
        ]
    );
    assert_eq!(b.layer_names(), vec!["b".to_owned()]);
    b.retract("a").unwrap();
    assert!(b.server().take().is_empty());

    b.shutdown().unwrap();
    let calls = b.server().take();
    assert!(calls.contains(&Call::DestroyWindow(103)));
    assert!(b.layer_names().is_empty());
}

#[test]
fn cell_size_prefers_resize_increment() {
    let b = backend(RecordingServer::default());
    assert_eq!(b.cell_size().unwrap(), Some(CellSize::new(10, 20).unwrap()));
}

#[test]
fn cell_size_falls_back_to_grid() {
    let server = Arc::new(RecordingServer {
        increment: None,
        ..RecordingServer::default()
    });
    let opts = NativeBackendOpts {
        grid: Arc::new(FixedGrid::new(80, 24)),
        ..NativeBackendOpts::new(anchor())
    };
    let b = NativeBackend::with_server(Arc::clone(&server), opts);
    assert_eq!(b.cell_size().unwrap(), Some(CellSize::new(10, 20).unwrap()));

    let closure_grid = NativeBackendOpts {
        grid: Arc::new(|| -> Option<(u32, u32)> { Some((160, 48)) }),
        ..NativeBackendOpts::new(anchor())
    };
    let b = NativeBackend::with_server(server, closure_grid);
    assert_eq!(b.cell_size().unwrap(), Some(CellSize::new(5, 10).unwrap()));
}

#[test]
fn unresolvable_cell_size_is_reported() {
    let b = backend(RecordingServer {
        increment: None,
        ..RecordingServer::default()
    });
    assert!(matches!(
        b.cell_size().unwrap_err(),
        TermlayerError::Resource(_)
    ));
}

#[test]
fn anchor_window_parses_decimal_and_hex() {
    assert_eq!(AnchorWindow::parse("42").unwrap(), AnchorWindow(WindowId(42)));
    assert_eq!(
        AnchorWindow::parse("0x1a00003").unwrap(),
        AnchorWindow(WindowId(0x1a00003))
    );
    assert_eq!(AnchorWindow::parse(" 17\n").unwrap().window(), WindowId(17));
    for bad in ["", "0", "0x", "window", "-3", "99999999999"] {
        assert!(matches!(
            AnchorWindow::parse(bad).unwrap_err(),
            TermlayerError::Config(_)
        ));
    }
}

#[test]
fn screen_format_is_resolved_once() {
    let dir = temp_dir("format");
    let path = dir.join("a.png");
    write_png(&path, 4, 4, [1, 1, 1, 255]);

    let b = backend(RecordingServer::default());
    b.issue(&request("a", &path, rect(0, 0, 1, 1))).unwrap();
    b.issue(&request("b", &path, rect(2, 0, 1, 1))).unwrap();
    b.issue(&request("a", &path, rect(0, 3, 2, 2))).unwrap();
    assert_eq!(b.screen_format().unwrap().depth, 24);
    assert_eq!(b.server().format_queries.load(Ordering::SeqCst), 1);
}

#[test]
fn failed_hint_query_is_reported() {
    let dir = temp_dir("hints");
    let path = dir.join("a.png");
    write_png(&path, 4, 4, [1, 1, 1, 255]);

    let b = backend(RecordingServer::default());
    b.server().fail_hints.store(true, Ordering::SeqCst);
    let err = b.issue(&request("a", &path, rect(0, 0, 2, 2))).unwrap_err();
    assert!(matches!(err, TermlayerError::Resource(_)));
    assert!(b.server().calls().iter().all(|c| !c.creates()));
    assert!(matches!(b.cell_size(), Err(TermlayerError::Resource(_))));
}

#[test]
fn oversized_placement_fails_before_allocating() {
    let dir = temp_dir("oversized");
    let path = dir.join("a.png");
    write_png(&path, 4, 4, [1, 1, 1, 255]);

    let b = backend(RecordingServer::default());
    let mut req = request("a", &path, rect(0, 0, u32::MAX, 1));
    req.policy = ScalePolicy::Distort;
    let err = b.issue(&req).unwrap_err();
    assert!(matches!(err, TermlayerError::Resource(_)));
    assert!(b.server().calls().iter().all(|c| !c.creates()));
    assert_eq!(resources(&b, "a"), Resources::Absent);

    req.rect = rect(0, 0, 8, 2);
    b.issue(&req).unwrap();
    assert!(
        b.server()
            .calls()
            .contains(&Call::CreatePixmap(101, Dimensions::new(80, 40)))
    );
}

struct SharedBackend(Arc<NativeBackend<RecordingServer>>);

impl RenderBackend for SharedBackend {
    fn issue(&self, req: &DrawRequest<'_>) -> TermlayerResult<()> {
        self.0.issue(req)
    }

    fn retract(&self, name: &str) -> TermlayerResult<()> {
        self.0.retract(name)
    }

    fn shutdown(&self) -> TermlayerResult<()> {
        self.0.shutdown()
    }
}

#[test]
fn removing_a_layer_whose_first_draw_failed_frees_its_slot() {
    let dir = temp_dir("leak");
    let path = dir.join("a.png");
    write_png(&path, 40, 20, [1, 1, 1, 255]);

    let native = Arc::new(backend(RecordingServer::default()));
    native.server().fail_pixmap.store(true, Ordering::SeqCst);
    let mut c = Compositor::new(
        Box::new(SharedBackend(Arc::clone(&native))),
        CompositorOpts::default(),
    );
    c.set_source("a", &path).unwrap();
    c.set_rect("a", rect(0, 0, 8, 2));
    assert!(c.render().is_err());
    assert_eq!(native.layer_names(), vec!["a".to_owned()]);

    assert!(c.remove_layer("a").unwrap());
    assert!(native.layer_names().is_empty());
}
