//! Multi-window demo
//!
//! Opens several windows, each with its own OpenGL context, and drives all of them from one
//! render loop. Every window pulses its background color and shows its frame rate in the
//! title bar. The program exits once every window is closed.
//!
//! Usage: `multiwindow [config.toml]`

mod app_config;

use std::path::PathBuf;

use thiserror::Error;

use lens_engine::assets::ImageData;
use lens_engine::config::{Config, ConfigError};
use lens_engine::foundation::logging;
use lens_engine::prelude::*;

use app_config::{AppConfig, AppWindow};

const VERTEX_SHADER: &str = r"#version 410 core
layout (location = 0) in vec2 a_pos;
out vec2 v_uv;
void main() {
    v_uv = a_pos * 0.5 + 0.5;
    gl_Position = vec4(a_pos, 0.0, 1.0);
}
";

const FRAGMENT_SHADER: &str = r"#version 410 core
in vec2 v_uv;
out vec4 frag_color;
uniform sampler2D u_texture;
uniform vec4 u_tint;
void main() {
    frag_color = texture(u_texture, v_uv) * u_tint;
}
";

/// Frames between title bar refreshes
const TITLE_REFRESH_FRAMES: u64 = 30;

#[derive(Error, Debug)]
enum AppError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("configuration lists no windows")]
    NoWindows,
}

fn pulse(base: [f32; 4], phase: f32) -> [f32; 4] {
    let k = 0.6 + 0.4 * phase.sin();
    [base[0] * k, base[1] * k, base[2] * k, base[3]]
}

fn window_render_fn(entry: &AppWindow) -> RenderFn {
    let base_title = entry.window.title.clone();
    let base_color = entry.window.background_color;
    let close_after = entry.close_after_secs;
    let pulse_speed = entry.pulse_speed;

    RenderFn::new(move |window: &mut dyn Window| {
        let elapsed = window.elapsed_time();
        let tint = pulse(base_color, elapsed as f32 * pulse_speed);
        window.set_clear_color(tint);

        if let (Ok(shader), Ok(texture)) = (window.shader(0), window.texture(0)) {
            let shader = shader.borrow();
            shader.bind();
            texture.borrow().bind(0);
            let result = shader
                .set("u_texture", UniformValue::Int(0))
                .and_then(|()| shader.set("u_tint", UniformValue::Vec4(tint)));
            if let Err(e) = result {
                log::warn!("{}: {}", base_title, e);
            }
        }

        if window.frame_count() % TITLE_REFRESH_FRAMES == 0 {
            if let Some(fps) = window.fps() {
                window.set_title(&format!("{base_title} - {fps:.0} FPS"));
            }
        }

        if close_after > 0.0 && elapsed >= close_after {
            log::info!("{} closing after {:.1}s, {} frames", base_title, elapsed, window.frame_count());
            window.close();
        }
    })
}

fn attach_resources(window: &mut ContextWindow) -> Result<(), AppError> {
    let shader = ProgramShader::from_memory(
        window.device().ok_or_else(|| EngineError::NotInitialized(window.title().to_string()))?,
        VERTEX_SHADER,
        FRAGMENT_SHADER,
        None,
    )?;
    let mut texture = ImageTexture::for_window(&*window)?;
    texture.load_image(&ImageData::checkerboard(64, 64, 8, [255; 4], [160, 160, 160, 255]))?;

    window.attach_shader(shader.into_shared());
    window.attach_texture(texture.into_shared());
    Ok(())
}

fn run(config: AppConfig) -> Result<(), AppError> {
    if config.windows.is_empty() {
        return Err(AppError::NoWindows);
    }

    let platform = GlfwPlatform::init()?;
    let mut renderer = MultiWindowRenderer::with_config(platform.clone(), config.renderer)?;

    for entry in &config.windows {
        let mut window = ContextWindow::with_config(platform.clone(), entry.window.clone())?;
        attach_resources(&mut window)?;
        window.set_render_fn(Some(window_render_fn(entry)));
        renderer.append_window(Box::new(window))?;
    }
    log::info!("Rendering {} windows", renderer.window_count());

    let result = renderer.render();
    renderer.release();
    platform.terminate();
    result.map_err(AppError::from)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_filter("info");

    let config = match std::env::args_os().nth(1) {
        Some(path) => {
            let path = PathBuf::from(path);
            log::info!("Loading configuration from {}", path.display());
            AppConfig::load_from_file(&path)?
        }
        None => AppConfig::default(),
    };

    run(config).map_err(|e| {
        log::error!("Demo failed: {}", e);
        e.into()
    })
}
