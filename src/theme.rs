use eframe::egui::{self, Color32, CornerRadius, FontId, Frame, Margin, Stroke, TextStyle};

use crate::transcript::Speaker;

#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color32,
    pub panel: Color32,
    pub raised: Color32,
    pub hover: Color32,
    pub accent: Color32,
    pub accent_dim: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub danger: Color32,
    pub text: Color32,
    pub text_dim: Color32,
    pub user_bubble: Color32,
    pub agent_bubble: Color32,
    pub tool_tint: Color32,
    pub selected_session: Color32,
    pub gap_small: f32,
    pub gap: f32,
    pub padding: f32,
    pub bubble_radius: u8,
    pub composer_radius: u8,
    pub image_max_width: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color32::from_rgb(0x11, 0x13, 0x18),
            panel: Color32::from_rgb(0x18, 0x1B, 0x22),
            raised: Color32::from_rgb(0x20, 0x24, 0x2D),
            hover: Color32::from_rgb(0x2A, 0x2F, 0x3A),
            accent: Color32::from_rgb(0x4C, 0x8D, 0xF6),
            accent_dim: Color32::from_rgb(0x2D, 0x5F, 0xB8),
            success: Color32::from_rgb(0x34, 0xC7, 0x6F),
            warning: Color32::from_rgb(0xE8, 0xA3, 0x1C),
            danger: Color32::from_rgb(0xE5, 0x4D, 0x4D),
            text: Color32::from_rgb(0xE4, 0xE8, 0xEE),
            text_dim: Color32::from_rgb(0x8A, 0x92, 0x9C),
            user_bubble: Color32::from_rgb(0x1E, 0x3A, 0x5F),
            agent_bubble: Color32::from_rgb(0x20, 0x24, 0x2D),
            tool_tint: Color32::from_rgb(0x24, 0x2A, 0x1E),
            selected_session: Color32::from_rgb(0x2D, 0x5F, 0xB8),
            gap_small: 4.0,
            gap: 8.0,
            padding: 12.0,
            bubble_radius: 8,
            composer_radius: 12,
            image_max_width: 640.0,
        }
    }
}

impl Theme {
    pub fn apply_visuals(&self, ctx: &egui::Context) {
        ctx.style_mut(|style| {
            let visuals = &mut style.visuals;
            *visuals = egui::Visuals::dark();
            visuals.panel_fill = self.panel;
            visuals.window_fill = self.panel;
            visuals.extreme_bg_color = self.background;
            visuals.override_text_color = Some(self.text);
            visuals.hyperlink_color = self.accent;
            visuals.selection.bg_fill = self.accent_dim;
            visuals.widgets.inactive.bg_fill = self.raised;
            visuals.widgets.inactive.weak_bg_fill = self.raised;
            visuals.widgets.inactive.bg_stroke = Stroke::NONE;
            visuals.widgets.hovered.bg_fill = self.hover;
            visuals.widgets.hovered.weak_bg_fill = self.hover;
            visuals.widgets.active.bg_fill = self.accent_dim;

            style.spacing.item_spacing = egui::vec2(self.gap, self.gap);
            style.spacing.button_padding = egui::vec2(10.0, 5.0);
            for (text_style, font) in [
                (TextStyle::Heading, FontId::proportional(18.0)),
                (TextStyle::Body, FontId::proportional(14.0)),
                (TextStyle::Button, FontId::proportional(14.0)),
                (TextStyle::Monospace, FontId::monospace(13.0)),
                (TextStyle::Small, FontId::proportional(11.5)),
            ] {
                style.text_styles.insert(text_style, font);
            }
        });
    }

    pub fn bubble_fill(&self, speaker: Speaker) -> Color32 {
        match speaker {
            Speaker::User => self.user_bubble,
            Speaker::Agent => self.agent_bubble,
        }
    }

    pub fn speaker_label(&self, speaker: Speaker) -> (&'static str, Color32) {
        match speaker {
            Speaker::User => ("You", self.accent),
            Speaker::Agent => ("Agent", self.success),
        }
    }

    pub fn entry_frame(&self, fill: Color32) -> Frame {
        Frame::new()
            .fill(fill)
            .inner_margin(Margin::symmetric(self.padding as i8, self.gap as i8))
            .corner_radius(CornerRadius::same(self.bubble_radius))
    }

    pub fn composer_frame(&self) -> Frame {
        Frame::new()
            .fill(self.raised)
            .inner_margin(Margin::same(self.gap as i8))
            .corner_radius(CornerRadius::same(self.composer_radius))
    }

    pub fn panel_frame(&self, fill: Color32) -> Frame {
        Frame::new()
            .fill(fill)
            .inner_margin(Margin::same(self.padding as i8))
    }
}
