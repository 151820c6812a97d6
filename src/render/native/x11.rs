use std::fmt::Display;
use std::ops::Range;

use x11rb::connection::{Connection, RequestConnection as _};
use x11rb::cookie::VoidCookie;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{
    AtomEnum, ConfigureWindowAux, ConnectionExt as _, CreateGCAux, CreateWindowAux, EventMask,
    ImageFormat, WindowClass,
};
use x11rb::rust_connection::RustConnection;

use crate::foundation::core::{Dimensions, PixelRect};
use crate::foundation::error::{TermlayerError, TermlayerResult};
use crate::render::native::server::{
    DisplayServer, GcId, PixmapId, ScreenFormat, ServerEvent, WindowId,
};

/// Fixed part of a PutImage request plus the big-requests length extension.
const PUT_IMAGE_OVERHEAD_BYTES: usize = 28;

/// `WM_SIZE_HINTS` is 18 32-bit fields; the resize increment sits at 9 and 10.
const WM_SIZE_HINTS_FIELDS: u32 = 18;
const RESIZE_INC_FIELD: usize = 9;
/// `PResizeInc` in the hints flags.
const P_RESIZE_INC: u32 = 1 << 6;

const WHITE_PIXEL: u32 = 0x00ff_ffff;

/// [`DisplayServer`] over an X11 connection.
pub struct X11Server {
    conn: RustConnection,
    screen_num: usize,
}

impl std::fmt::Debug for X11Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X11Server")
            .field("screen_num", &self.screen_num)
            .finish_non_exhaustive()
    }
}

impl X11Server {
    /// Connect to `display`, or to `$DISPLAY` when `None`.
    pub fn connect(display: Option<&str>) -> TermlayerResult<Self> {
        let (conn, screen_num) = x11rb::connect(display).map_err(failed("connect to X server"))?;
        tracing::debug!(screen_num, "connected to X server");
        Ok(Self { conn, screen_num })
    }

    fn checked(
        &self,
        what: &'static str,
        cookie: Result<VoidCookie<'_, RustConnection>, x11rb::errors::ConnectionError>,
    ) -> TermlayerResult<()> {
        cookie.map_err(failed(what))?.check().map_err(failed(what))
    }

    fn id(&self, what: &'static str) -> TermlayerResult<u32> {
        self.conn.generate_id().map_err(failed(what))
    }
}

impl DisplayServer for X11Server {
    fn screen_format(&self) -> TermlayerResult<ScreenFormat> {
        let screen = self
            .conn
            .setup()
            .roots
            .get(self.screen_num)
            .ok_or_else(|| TermlayerError::resource("X server has no default screen"))?;
        Ok(ScreenFormat {
            depth: screen.root_depth,
            visual: screen.root_visual,
        })
    }

    fn max_upload_bytes(&self) -> usize {
        self.conn
            .maximum_request_bytes()
            .saturating_sub(PUT_IMAGE_OVERHEAD_BYTES)
    }

    fn create_window(
        &self,
        parent: WindowId,
        format: ScreenFormat,
        rect: PixelRect,
    ) -> TermlayerResult<WindowId> {
        let wid = self.id("allocate window id")?;
        let aux = CreateWindowAux::new()
            .background_pixel(WHITE_PIXEL)
            .event_mask(EventMask::EXPOSURE);
        self.checked(
            "create window",
            self.conn.create_window(
                format.depth,
                wid,
                parent.0,
                coord(rect.x)?,
                coord(rect.y)?,
                extent(rect.width)?,
                extent(rect.height)?,
                0,
                WindowClass::INPUT_OUTPUT,
                format.visual,
                &aux,
            ),
        )?;
        Ok(WindowId(wid))
    }

    fn create_pixmap(
        &self,
        format: ScreenFormat,
        window: WindowId,
        size: Dimensions,
    ) -> TermlayerResult<PixmapId> {
        let pid = self.id("allocate pixmap id")?;
        self.checked(
            "create pixmap",
            self.conn.create_pixmap(
                format.depth,
                pid,
                window.0,
                extent(size.w)?,
                extent(size.h)?,
            ),
        )?;
        Ok(PixmapId(pid))
    }

    fn create_gc(&self, pixmap: PixmapId) -> TermlayerResult<GcId> {
        let gid = self.id("allocate graphics context id")?;
        self.checked(
            "create graphics context",
            self.conn.create_gc(gid, pixmap.0, &CreateGCAux::new()),
        )?;
        Ok(GcId(gid))
    }

    fn put_image(
        &self,
        pixmap: PixmapId,
        gc: GcId,
        depth: u8,
        width: u32,
        rows: Range<u32>,
        data: &[u8],
    ) -> TermlayerResult<()> {
        self.conn
            .put_image(
                ImageFormat::Z_PIXMAP,
                pixmap.0,
                gc.0,
                extent(width)?,
                extent(rows.end - rows.start)?,
                0,
                coord(rows.start as i32)?,
                0,
                depth,
                data,
            )
            .map_err(failed("put image"))?;
        Ok(())
    }

    fn copy_area(
        &self,
        src: PixmapId,
        dst: WindowId,
        gc: GcId,
        size: Dimensions,
    ) -> TermlayerResult<()> {
        self.conn
            .copy_area(src.0, dst.0, gc.0, 0, 0, 0, 0, extent(size.w)?, extent(size.h)?)
            .map_err(failed("copy area"))?;
        Ok(())
    }

    fn move_window(&self, window: WindowId, x: i32, y: i32) -> TermlayerResult<()> {
        self.conn
            .configure_window(window.0, &ConfigureWindowAux::new().x(x).y(y))
            .map_err(failed("move window"))?;
        Ok(())
    }

    fn map_window(&self, window: WindowId) -> TermlayerResult<()> {
        self.conn.map_window(window.0).map_err(failed("map window"))?;
        Ok(())
    }

    fn unmap_window(&self, window: WindowId) -> TermlayerResult<()> {
        self.conn
            .unmap_window(window.0)
            .map_err(failed("unmap window"))?;
        Ok(())
    }

    fn destroy_window(&self, window: WindowId) -> TermlayerResult<()> {
        self.conn
            .destroy_window(window.0)
            .map_err(failed("destroy window"))?;
        Ok(())
    }

    fn free_pixmap(&self, pixmap: PixmapId) -> TermlayerResult<()> {
        self.conn
            .free_pixmap(pixmap.0)
            .map_err(failed("free pixmap"))?;
        Ok(())
    }

    fn free_gc(&self, gc: GcId) -> TermlayerResult<()> {
        self.conn.free_gc(gc.0).map_err(failed("free gc"))?;
        Ok(())
    }

    fn window_size(&self, window: WindowId) -> TermlayerResult<Dimensions> {
        let reply = self
            .conn
            .get_geometry(window.0)
            .map_err(failed("query window geometry"))?
            .reply()
            .map_err(failed("query window geometry"))?;
        Ok(Dimensions::new(
            u32::from(reply.width),
            u32::from(reply.height),
        ))
    }

    fn resize_increment(&self, window: WindowId) -> TermlayerResult<Option<Dimensions>> {
        let reply = self
            .conn
            .get_property(
                false,
                window.0,
                AtomEnum::WM_NORMAL_HINTS,
                AtomEnum::ANY,
                0,
                WM_SIZE_HINTS_FIELDS,
            )
            .map_err(failed("query WM_NORMAL_HINTS"))?
            .reply()
            .map_err(failed("query WM_NORMAL_HINTS"))?;

        let Some(values) = reply.value32() else {
            return Ok(None);
        };
        let values: Vec<u32> = values.collect();
        if values.first().is_none_or(|flags| flags & P_RESIZE_INC == 0) {
            return Ok(None);
        }
        let (Some(&w), Some(&h)) = (
            values.get(RESIZE_INC_FIELD),
            values.get(RESIZE_INC_FIELD + 1),
        ) else {
            return Ok(None);
        };
        // Fields are CARD32 on the wire but signed in ICCCM.
        if (w as i32) <= 0 || (h as i32) <= 0 {
            return Ok(None);
        }
        Ok(Some(Dimensions::new(w, h)))
    }

    fn flush(&self) -> TermlayerResult<()> {
        self.conn.flush().map_err(failed("flush X connection"))
    }

    fn sync(&self) -> TermlayerResult<()> {
        self.conn
            .get_input_focus()
            .map_err(failed("sync X connection"))?
            .reply()
            .map_err(failed("sync X connection"))?;
        Ok(())
    }

    fn next_event(&self, block: bool) -> TermlayerResult<Option<ServerEvent>> {
        let event = if block {
            Some(
                self.conn
                    .wait_for_event()
                    .map_err(failed("wait for X event"))?,
            )
        } else {
            self.conn
                .poll_for_event()
                .map_err(failed("poll for X event"))?
        };

        event
            .map(|event| match event {
                Event::Expose(e) => Ok(ServerEvent::Expose {
                    window: WindowId(e.window),
                }),
                Event::Error(e) => Err(TermlayerError::resource(format!(
                    "X request failed: {:?} (major opcode {}, bad value {})",
                    e.error_kind, e.major_opcode, e.bad_value
                ))),
                _ => Ok(ServerEvent::Other),
            })
            .transpose()
    }
}

fn failed<E: Display>(what: &'static str) -> impl FnOnce(E) -> TermlayerError {
    move |e| TermlayerError::resource(format!("{what}: {e}"))
}

fn coord(v: i32) -> TermlayerResult<i16> {
    i16::try_from(v).map_err(|_| TermlayerError::resource(format!("coordinate {v} out of range")))
}

fn extent(v: u32) -> TermlayerResult<u16> {
    u16::try_from(v).map_err(|_| TermlayerError::resource(format!("extent {v} out of range")))
}
