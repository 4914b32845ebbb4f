// src/ui.rs - Video texture and pinch overlays drawn with the egui painter
use std::collections::VecDeque;

use eframe::egui::{self, Color32, Pos2, Rect, Vec2};
use image::RgbImage;

use crate::geometry::PixelPoint;
use crate::landmarks::Handedness;
use crate::pipeline::FrameOutcome;
use crate::tracking::{Fired, HandAnnotation};

#[derive(Debug, Clone)]
pub struct Theme {
    pub marker: Color32,
    pub background: Color32,
    pub surface: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            marker: Color32::from_rgb(0, 255, 0),
            background: Color32::from_rgb(20, 20, 25),
            surface: Color32::from_rgb(50, 50, 55),
            text_primary: Color32::WHITE,
            text_secondary: Color32::from_rgb(150, 150, 155),
        }
    }
}

/// Maps frame pixels onto the on-screen rectangle the frame is drawn in.
#[derive(Debug, Clone, Copy)]
pub struct FrameMapping {
    pub rect: Rect,
    pub frame_size: Vec2,
}

impl FrameMapping {
    pub fn to_screen(&self, p: &PixelPoint) -> Pos2 {
        let sx = self.rect.width() / self.frame_size.x.max(1.0);
        let sy = self.rect.height() / self.frame_size.y.max(1.0);
        Pos2::new(self.rect.left() + p.x * sx, self.rect.top() + p.y * sy)
    }

    pub fn scale(&self) -> f32 {
        self.rect.width() / self.frame_size.x.max(1.0)
    }
}

/// Where the hand label goes, in frame pixels.
fn label_anchor(handedness: Handedness, frame_width: f32) -> PixelPoint {
    match handedness {
        Handedness::Left => PixelPoint::new(20.0, 50.0),
        Handedness::Right => PixelPoint::new(frame_width - 180.0, 50.0),
    }
}

pub fn draw_hand_overlay(
    painter: &egui::Painter,
    mapping: &FrameMapping,
    hand: &HandAnnotation,
    theme: &Theme,
) {
    let scale = mapping.scale();

    painter.text(
        mapping.to_screen(&label_anchor(hand.handedness, mapping.frame_size.x)),
        egui::Align2::LEFT_BOTTOM,
        format!("{} Hand", hand.handedness),
        egui::FontId::proportional(26.0 * scale),
        theme.marker,
    );

    for (id, point) in &hand.markers {
        let pos = mapping.to_screen(point);
        painter.circle_filled(pos, 10.0 * scale, theme.marker);
        painter.text(
            pos + Vec2::new(0.0, 15.0 * scale),
            egui::Align2::LEFT_TOP,
            format!("ID {}", id),
            egui::FontId::proportional(16.0 * scale),
            theme.marker,
        );
    }

    if hand.is_close() {
        painter.text(
            mapping.to_screen(&hand.thumb) + Vec2::new(0.0, 15.0 * scale),
            egui::Align2::LEFT_TOP,
            "Close",
            egui::FontId::proportional(16.0 * scale),
            theme.marker,
        );
    }
}

/// Latest frame as a texture, plus the annotations that belong to it.
pub struct VideoView {
    texture: Option<egui::TextureHandle>,
    frame_size: Vec2,
    outcome: FrameOutcome,
    recent: VecDeque<Fired>,
}

impl VideoView {
    const RECENT: usize = 8;

    pub fn new() -> Self {
        Self {
            texture: None,
            frame_size: Vec2::new(640.0, 480.0),
            outcome: FrameOutcome::default(),
            recent: VecDeque::with_capacity(Self::RECENT),
        }
    }

    pub fn update_frame(&mut self, ctx: &egui::Context, frame: &RgbImage, outcome: &FrameOutcome) {
        let size = [frame.width() as usize, frame.height() as usize];
        let color_image = egui::ColorImage::from_rgb(size, frame.as_raw());

        match self.texture.as_mut() {
            Some(texture) => texture.set(color_image, Default::default()),
            None => {
                self.texture = Some(ctx.load_texture("video_frame", color_image, Default::default()))
            }
        }

        self.frame_size = Vec2::new(frame.width() as f32, frame.height() as f32);
        self.outcome = outcome.clone();
        for fired in &outcome.fired {
            if self.recent.len() == Self::RECENT {
                self.recent.pop_back();
            }
            self.recent.push_front(fired.clone());
        }
    }

    pub fn recent(&self) -> impl Iterator<Item = &Fired> {
        self.recent.iter()
    }

    pub fn show(&self, ui: &mut egui::Ui, theme: &Theme) {
        let available = ui.available_size();
        let aspect = self.frame_size.x / self.frame_size.y.max(1.0);
        let width = available.x.min(available.y * aspect);
        let size = Vec2::new(width, width / aspect);

        let (rect, _response) = ui.allocate_exact_size(size, egui::Sense::hover());
        let painter = ui.painter_at(rect);

        let Some(texture) = self.texture.as_ref() else {
            painter.rect_filled(rect, egui::Rounding::same(4.0), theme.surface);
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "No Video Signal",
                egui::FontId::proportional(16.0),
                theme.text_secondary,
            );
            return;
        };

        painter.image(
            texture.id(),
            rect,
            Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
            Color32::WHITE,
        );

        let mapping = FrameMapping {
            rect,
            frame_size: self.frame_size,
        };
        for hand in &self.outcome.hands {
            draw_hand_overlay(&painter, &mapping, hand, theme);
        }
    }
}

impl Default for VideoView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_scales_into_rect() {
        let mapping = FrameMapping {
            rect: Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::new(320.0, 240.0)),
            frame_size: Vec2::new(640.0, 480.0),
        };
        assert_eq!(mapping.to_screen(&PixelPoint::new(0.0, 0.0)), Pos2::new(10.0, 20.0));
        assert_eq!(mapping.to_screen(&PixelPoint::new(640.0, 480.0)), Pos2::new(330.0, 260.0));
        assert_eq!(mapping.scale(), 0.5);
    }

    #[test]
    fn test_label_anchors() {
        assert_eq!(label_anchor(Handedness::Left, 640.0), PixelPoint::new(20.0, 50.0));
        assert_eq!(label_anchor(Handedness::Right, 640.0), PixelPoint::new(460.0, 50.0));
    }
}
