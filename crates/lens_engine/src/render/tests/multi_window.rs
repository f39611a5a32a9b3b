use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;

use crate::config::Config;
use crate::core::config::{RendererConfig, WindowConfig};
use crate::foundation::math::{Mat4, Vec3};
use crate::render::api::{Camera, RenderFn, Renderer, Texture, Window};
use crate::render::backend::headless::{DeviceCall, HeadlessPlatform};
use crate::render::camera::{CameraMovement, EulerCamera};
use crate::render::renderer::MultiWindowRenderer;
use crate::render::shader::{ProgramShader, UniformValue};
use crate::render::texture::ImageTexture;

/// 180 presents per simulated second, shared by three windows: 60 frames each
const FRAME_INTERVAL: f64 = 1.0 / 180.0;

/// Frames a window should see on the simulated clock. The 20% tolerance used with it is on
/// frame counts; instantaneous fps in a steady stretch is exact to 1%.
fn expected_frames(seconds: f64, open_windows: f64) -> f64 {
    seconds / FRAME_INTERVAL / open_windows
}

const COLORS: [[f32; 4]; 3] = [
    [1.0, 0.0, 0.0, 1.0],
    [0.0, 1.0, 0.0, 1.0],
    [0.0, 0.0, 1.0, 1.0],
];

fn close_after(seconds: f64) -> RenderFn {
    RenderFn::new(move |window: &mut dyn Window| {
        if window.elapsed_time() >= seconds {
            window.close();
        }
    })
}

fn three_windows(platform: &Rc<HeadlessPlatform>, seconds: f64) -> MultiWindowRenderer {
    let mut renderer =
        MultiWindowRenderer::with_config(platform.clone(), RendererConfig::new("scenario")).unwrap();
    for (i, color) in COLORS.iter().enumerate() {
        let config = WindowConfig::new(format!("Window {i}"))
            .with_name(format!("window-{i}"))
            .with_size(320, 240)
            .with_background_color(*color)
            .with_render_fn(close_after(seconds));
        let window = crate::render::window::ContextWindow::with_config(platform.clone(), config).unwrap();
        renderer.append_window(Box::new(window)).unwrap();
    }
    renderer
}

fn run_scenario(seconds: f64) {
    let platform = HeadlessPlatform::new();
    platform.set_frame_interval(FRAME_INTERVAL);
    let mut renderer = three_windows(&platform, seconds);

    renderer.render().unwrap();
    assert!(renderer.all_windows_closed());

    for (index, color) in COLORS.iter().enumerate() {
        let window = renderer.window(index).unwrap();
        assert!(window.is_closed());

        let frames = window.frame_count() as f64;
        assert!(window.elapsed_time() >= seconds);
        assert_relative_eq!(frames, expected_frames(seconds, 3.0), max_relative = 0.2);
        assert_relative_eq!(window.fps().unwrap(), 60.0, max_relative = 0.01);
        assert_relative_eq!(window.average_fps().unwrap(), 60.0, max_relative = 0.05);

        let device = platform.surface(index).unwrap().device().unwrap();
        let clears = device.clear_colors();
        assert_eq!(clears.len() as f64, frames);
        assert!(clears.iter().all(|c| c == color));
    }
}

#[test]
fn test_three_windows_for_one_second() {
    run_scenario(1.0);
}

#[test]
fn test_three_windows_for_two_seconds() {
    run_scenario(2.0);
}

#[test]
fn test_three_windows_for_three_seconds() {
    run_scenario(3.0);
}

#[test]
fn test_one_renderer_closing_windows_at_one_two_three_seconds() {
    let platform = HeadlessPlatform::new();
    platform.set_frame_interval(FRAME_INTERVAL);
    let mut renderer =
        MultiWindowRenderer::with_config(platform.clone(), RendererConfig::new("staggered")).unwrap();
    for (i, seconds) in [1.0, 2.0, 3.0].into_iter().enumerate() {
        let config = WindowConfig::new(format!("Closes at {seconds}s"))
            .with_background_color(COLORS[i])
            .with_render_fn(close_after(seconds));
        let window = crate::render::window::ContextWindow::with_config(platform.clone(), config).unwrap();
        renderer.append_window(Box::new(window)).unwrap();
    }

    renderer.render().unwrap();
    assert!(renderer.all_windows_closed());

    // three windows share the first second, two the next, the last runs alone
    let first = expected_frames(1.0, 3.0);
    let second = first + expected_frames(1.0, 2.0);
    let third = second + expected_frames(1.0, 1.0);
    for (index, (frames, fps)) in [(first, 60.0), (second, 90.0), (third, 180.0)].into_iter().enumerate() {
        let window = renderer.window(index).unwrap();
        assert!(window.is_closed());
        assert_relative_eq!(window.frame_count() as f64, frames, max_relative = 0.2);
        assert_relative_eq!(window.fps().unwrap(), fps, max_relative = 0.01);
        assert!(window.elapsed_time() >= (index + 1) as f64);
    }
}

#[test]
fn test_windows_closing_at_different_times() {
    let platform = HeadlessPlatform::new();
    platform.set_frame_interval(FRAME_INTERVAL);
    let mut renderer =
        MultiWindowRenderer::with_config(platform.clone(), RendererConfig::default()).unwrap();
    for seconds in [0.5, 1.0, 1.5] {
        let config = WindowConfig::default().with_render_fn(close_after(seconds));
        let window = crate::render::window::ContextWindow::with_config(platform.clone(), config).unwrap();
        renderer.append_window(Box::new(window)).unwrap();
    }

    renderer.render().unwrap();
    let counts: Vec<u64> = renderer.windows().map(|w| w.frame_count()).collect();
    assert!(counts[0] < counts[1] && counts[1] < counts[2], "{counts:?}");
    // once alone, the last window gets every present
    assert_relative_eq!(renderer.window(2).unwrap().fps().unwrap(), 180.0, max_relative = 0.01);

    renderer.release();
    assert_eq!(renderer.window_count(), 0);
    for index in 0..3 {
        assert!(platform.surface(index).unwrap().is_destroyed());
    }
}

#[test]
fn test_callbacks_drive_shared_resources() {
    const VERTEX: &str = "#version 410 core\n\
        layout (location = 0) in vec3 a_pos;\n\
        uniform mat4 u_view;\n\
        void main() { gl_Position = u_view * vec4(a_pos, 1.0); }\n";
    const FRAGMENT: &str = "#version 410 core\n\
        uniform sampler2D u_texture;\n\
        uniform float u_time;\n\
        out vec4 frag_color;\n\
        void main() { frag_color = vec4(u_time); }\n";

    let platform = HeadlessPlatform::new();
    let mut renderer =
        MultiWindowRenderer::with_config(platform.clone(), RendererConfig::default()).unwrap();
    let mut window =
        crate::render::window::ContextWindow::with_config(platform.clone(), WindowConfig::default()).unwrap();

    let device = window.device().unwrap();
    let shader = ProgramShader::from_memory(device.clone(), VERTEX, FRAGMENT, None).unwrap();
    let mut texture = ImageTexture::new(device);
    texture.load_memory(2, 2, &[128; 16]).unwrap();
    window.attach_shader(shader.into_shared());
    window.attach_texture(texture.into_shared());

    let camera = Rc::new(RefCell::new(EulerCamera::new("fly")));
    let camera_in_loop = Rc::clone(&camera);
    window.set_render_fn(Some(RenderFn::new(move |window: &mut dyn Window| {
        let mut camera = camera_in_loop.borrow_mut();
        camera.process_movement(window.delta_time() as f32, CameraMovement::Forward, 1.0);

        let shader = window.shader(0).unwrap();
        let texture = window.texture(0).unwrap();
        let shader = shader.borrow();
        shader.bind();
        texture.borrow().bind(0);
        shader.set("u_view", camera.view_matrix().into()).unwrap();
        shader.set("u_texture", UniformValue::Int(0)).unwrap();
        shader.set("u_time", UniformValue::Float(window.elapsed_time() as f32)).unwrap();

        if window.frame_count() == 10 {
            window.close();
        }
    })));
    renderer.append_window(Box::new(window)).unwrap();
    renderer.render().unwrap();

    let device = platform.surface(0).unwrap().device().unwrap();
    let uploads = device
        .calls()
        .iter()
        .filter(|call| matches!(call, DeviceCall::SetUniform(..)))
        .count();
    assert_eq!(uploads, 30);
    assert!(device.calls().iter().any(|call| matches!(call, DeviceCall::BindTexture(0, _))));

    // nine measured intervals of one 60 Hz frame each
    let camera = camera.borrow();
    assert_relative_eq!(camera.position().x, 9.0 / 60.0, epsilon = 1e-4);
    assert_ne!(camera.view_matrix(), Mat4::identity());
    assert_relative_eq!(camera.front(), Vec3::new(1.0, 0.0, 0.0));
}

#[test]
fn test_windows_from_a_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("windows.ron");
    let saved = WindowConfig::new("From file")
        .with_size(640, 360)
        .with_position(100, 50)
        .with_background_color([0.2, 0.3, 0.4, 1.0]);
    saved.save_to_file(&path).unwrap();

    let platform = HeadlessPlatform::new();
    let mut loaded = WindowConfig::load_from_file(&path).unwrap();
    loaded.render_fn = Some(close_after(0.0));
    let window = crate::render::window::ContextWindow::with_config(platform.clone(), loaded).unwrap();

    assert_eq!(window.title(), "From file");
    assert_eq!(window.size(), (640, 360));
    assert_eq!(window.clear_color(), [0.2, 0.3, 0.4, 1.0]);
    assert_eq!(platform.surface(0).unwrap().position(), Some((100, 50)));

    let mut renderer =
        MultiWindowRenderer::with_config(platform.clone(), RendererConfig::default()).unwrap();
    renderer.append_window(Box::new(window)).unwrap();
    renderer.render().unwrap();
    assert_eq!(renderer.window(0).unwrap().frame_count(), 1);
}
