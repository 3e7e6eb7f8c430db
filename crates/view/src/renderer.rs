use glam::Vec2;
use std::fmt::Write;

use crate::frame::Frame;

/// Camera over the 2D world.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    pub center: Vec2,
    /// Half extents of the visible area in world units.
    pub half_extents: Vec2,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            half_extents: Vec2::new(640.0, 360.0),
        }
    }
}

impl RenderView {
    pub fn contains(&self, pos: Vec2) -> bool {
        let d = (pos - self.center).abs();
        d.x <= self.half_extents.x && d.y <= self.half_extents.y
    }
}

/// Anything that turns a published frame into output. Renderers only ever
/// see frames, never the cosmos.
pub trait Renderer {
    type Output;

    fn render(&self, frame: &Frame, view: &RenderView) -> Self::Output;
}

/// Human-readable dump of a frame, for the CLI and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, frame: &Frame, view: &RenderView) -> String {
        let mut out = String::new();
        let on_screen: Vec<_> = frame
            .entities
            .iter()
            .filter(|e| view.contains(e.transform.pos))
            .collect();

        let _ = writeln!(
            out,
            "=== Frame (step={}) ===\nEntities: {} ({} on screen)\nSounds: {}  Particles: {}",
            frame.step,
            frame.entities.len(),
            on_screen.len(),
            frame.sounds.len(),
            frame.particles.len()
        );
        for e in on_screen {
            let p = e.transform.pos;
            let _ = write!(
                out,
                "  {:<10} {} pos=({:.1}, {:.1}) rot={:.0}",
                e.name, e.id, p.x, p.y, e.transform.rotation
            );
            if let Some(h) = e.health {
                let _ = write!(out, " hp={:.0}%", h * 100.0);
            }
            if let Some(seen) = frame.visible.get(&e.id) {
                let _ = write!(out, " sees={}", seen.len());
            }
            out.push('\n');
        }
        out
    }
}
