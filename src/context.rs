//! Headless OpenGL context on an EGL pbuffer surface.

use std::ffi::c_void;

use khronos_egl as egl;

use crate::driver::DriverError;

type EglInstance = egl::DynamicInstance<egl::EGL1_4>;

const CONFIG_ATTRIBS: [egl::Int; 15] = [
    egl::SURFACE_TYPE,
    egl::PBUFFER_BIT,
    egl::BLUE_SIZE,
    8,
    egl::GREEN_SIZE,
    8,
    egl::RED_SIZE,
    8,
    egl::ALPHA_SIZE,
    8,
    egl::DEPTH_SIZE,
    8,
    egl::RENDERABLE_TYPE,
    egl::OPENGL_BIT,
    egl::NONE,
];

fn context_error(step: &str, err: impl std::fmt::Display) -> DriverError {
    DriverError::Context {
        message: format!("{}: {}", step, err),
    }
}

/// An offscreen rendering target of a fixed size.
///
/// libEGL is loaded at runtime, so building the crate does not require EGL
/// development files; creating a context on a machine without EGL fails with
/// [`DriverError::Context`].
pub struct HeadlessContext {
    egl: EglInstance,
    display: egl::Display,
    surface: egl::Surface,
    context: egl::Context,
    width: u32,
    height: u32,
}

impl HeadlessContext {
    /// Create a `width` x `height` pbuffer context bound to the desktop OpenGL API.
    pub fn new(width: u32, height: u32) -> Result<Self, DriverError> {
        let (Ok(egl_width), Ok(egl_height)) = (egl::Int::try_from(width), egl::Int::try_from(height))
        else {
            return Err(DriverError::Context {
                message: format!("{}x{} does not fit an EGL surface size", width, height),
            });
        };

        // SAFETY: loading libEGL runs its initialisers; nothing else is
        // touched until the instance is returned.
        let egl = unsafe { EglInstance::load_required() }
            .map_err(|e| context_error("loading libEGL", e))?;

        // SAFETY: DEFAULT_DISPLAY is always a valid native display id.
        let display = unsafe { egl.get_display(egl::DEFAULT_DISPLAY) }.ok_or_else(|| {
            DriverError::Context {
                message: "no default EGL display".to_string(),
            }
        })?;
        let (major, minor) = egl
            .initialize(display)
            .map_err(|e| context_error("eglInitialize", e))?;
        log::debug!("EGL {}.{} initialised", major, minor);

        let config = egl
            .choose_first_config(display, &CONFIG_ATTRIBS)
            .map_err(|e| context_error("eglChooseConfig", e))?
            .ok_or_else(|| DriverError::Context {
                message: "no EGL config with an RGBA8 pbuffer".to_string(),
            })?;

        let pbuffer_attribs = [
            egl::WIDTH,
            egl_width,
            egl::HEIGHT,
            egl_height,
            egl::NONE,
        ];
        let surface = egl
            .create_pbuffer_surface(display, config, &pbuffer_attribs)
            .map_err(|e| context_error("eglCreatePbufferSurface", e))?;

        egl.bind_api(egl::OPENGL_API)
            .map_err(|e| context_error("eglBindAPI", e))?;

        let context = egl
            .create_context(display, config, None, &[egl::NONE])
            .map_err(|e| context_error("eglCreateContext", e))?;

        log::info!("Created {}x{} headless context", width, height);
        Ok(Self {
            egl,
            display,
            surface,
            context,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bind the context and its pbuffer to the calling thread.
    pub fn make_current(&self) -> Result<(), DriverError> {
        self.egl
            .make_current(
                self.display,
                Some(self.surface),
                Some(self.surface),
                Some(self.context),
            )
            .map_err(|e| context_error("eglMakeCurrent", e))
    }

    /// Entry point for a GL function, or null when the driver lacks it.
    pub fn proc_address(&self, name: &str) -> *const c_void {
        self.egl
            .get_proc_address(name)
            .map_or(std::ptr::null(), |f| f as *const c_void)
    }
}

impl Drop for HeadlessContext {
    fn drop(&mut self) {
        let released = self
            .egl
            .make_current(self.display, None, None, None)
            .and_then(|()| self.egl.destroy_surface(self.display, self.surface))
            .and_then(|()| self.egl.destroy_context(self.display, self.context))
            .and_then(|()| self.egl.terminate(self.display));
        if let Err(e) = released {
            log::warn!("Failed to tear down EGL context: {}", e);
        }
    }
}
