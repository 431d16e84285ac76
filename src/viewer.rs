//! Interactive framebuffer viewer.
//!
//! Opens a scaled window over the 320x190 canvas. Space cycles through
//! the provided frames (convert mode passes the converted and original
//! images so they can be flicked between), Escape or closing the window
//! quits.

use anyhow::Context;
use pixels::{Pixels, SurfaceTexture};
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use sci_pic::{PIC_HEIGHT, PIC_WIDTH};

const SCALE: f64 = 3.0;

/// One displayable frame: a full-canvas RGBA8 buffer.
pub struct Frame {
    pub label: &'static str,
    pub rgba: Vec<u8>,
}

/// Show the frames until the user closes the window. The event loop
/// takes over the thread and exits the process when the window closes.
pub fn show(title: &str, frames: Vec<Frame>) -> anyhow::Result<()> {
    assert!(!frames.is_empty());
    for frame in &frames {
        assert_eq!(frame.rgba.len(), PIC_WIDTH * PIC_HEIGHT * 4);
    }

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title(title)
        .with_inner_size(LogicalSize::new(
            PIC_WIDTH as f64 * SCALE,
            PIC_HEIGHT as f64 * SCALE,
        ))
        .build(&event_loop)
        .context("creating window")?;

    let surface = SurfaceTexture::new(
        window.inner_size().width,
        window.inner_size().height,
        &window,
    );
    let mut pixels = Pixels::new(PIC_WIDTH as u32, PIC_HEIGHT as u32, surface)
        .context("creating pixel surface")?;

    let base_title = title.to_string();
    let mut current = 0usize;
    pixels.frame_mut().copy_from_slice(&frames[current].rgba);
    window.set_title(&format!("{} - {}", base_title, frames[current].label));

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => *control_flow = ControlFlow::Exit,

            Event::WindowEvent {
                event: WindowEvent::Resized(size),
                ..
            } => {
                if pixels.resize_surface(size.width, size.height).is_err() {
                    *control_flow = ControlFlow::Exit;
                }
            }

            Event::WindowEvent {
                event:
                    WindowEvent::KeyboardInput {
                        input:
                            KeyboardInput {
                                state: ElementState::Pressed,
                                virtual_keycode: Some(key),
                                ..
                            },
                        ..
                    },
                ..
            } => match key {
                VirtualKeyCode::Escape => *control_flow = ControlFlow::Exit,
                VirtualKeyCode::Space => {
                    current = (current + 1) % frames.len();
                    pixels.frame_mut().copy_from_slice(&frames[current].rgba);
                    window.set_title(&format!("{} - {}", base_title, frames[current].label));
                    window.request_redraw();
                }
                _ => {}
            },

            Event::RedrawRequested(_) => {
                if pixels.render().is_err() {
                    *control_flow = ControlFlow::Exit;
                }
            }

            _ => {}
        }
    });

    #[allow(unreachable_code)]
    Ok(())
}
