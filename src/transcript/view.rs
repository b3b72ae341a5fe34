use base64::Engine;
use eframe::egui::{self, ColorImage, RichText, TextureHandle, TextureOptions};
use std::collections::HashMap;
use thiserror::Error;

use super::{ToolResultEntry, Transcript, TranscriptEntry};
use crate::theme::Theme;

#[derive(Debug, Error)]
pub enum ImageDecodeError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid png payload: {0}")]
    Image(#[from] image::ImageError),
}

pub fn decode_png_base64(data: &str) -> Result<ColorImage, ImageDecodeError> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(data.trim())?;
    let rgba = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

enum ImageSlot {
    Ready(TextureHandle),
    Failed(String),
}

#[derive(Default)]
pub struct TranscriptView {
    images: HashMap<usize, ImageSlot>,
    generation: u64,
}

impl TranscriptView {
    pub fn show(&mut self, ui: &mut egui::Ui, theme: &Theme, transcript: &Transcript) {
        if transcript.generation() != self.generation {
            self.images.clear();
            self.generation = transcript.generation();
        }

        for (index, entry) in transcript.entries().iter().enumerate() {
            match entry {
                TranscriptEntry::Text { speaker, text } => {
                    let (label, color) = theme.speaker_label(*speaker);
                    theme
                        .entry_frame(theme.bubble_fill(*speaker))
                        .show(ui, |ui| {
                            ui.set_width(ui.available_width());
                            ui.label(RichText::new(label).color(color).strong());
                            ui.label(text);
                        });
                }
                TranscriptEntry::ToolUse(tool_use) => {
                    let response = ui.label(
                        RichText::new(format!("[{}]", tool_use.label())).color(theme.warning),
                    );
                    if let Some(raw) = &tool_use.raw {
                        response.on_hover_text(raw);
                    }
                }
                TranscriptEntry::ToolResult(result) => {
                    theme.entry_frame(theme.tool_tint).show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        self.show_tool_result(ui, theme, index, result);
                    });
                }
                TranscriptEntry::Error(message) => {
                    ui.label(RichText::new(message).color(theme.danger));
                }
                TranscriptEntry::Diagnostic(line) => {
                    ui.label(RichText::new(line).monospace().small().color(theme.text_dim));
                }
                TranscriptEntry::Completed(message) => {
                    let text = message.as_deref().unwrap_or("Task completed");
                    ui.label(RichText::new(text).color(theme.success).strong());
                    ui.separator();
                }
            }
            ui.add_space(theme.gap_small);
        }
    }

    fn show_tool_result(
        &mut self,
        ui: &mut egui::Ui,
        theme: &Theme,
        index: usize,
        result: &ToolResultEntry,
    ) {
        ui.label(
            RichText::new(format!("Tool result {}", result.tool_use_id))
                .small()
                .color(theme.text_dim),
        );
        if result.is_empty() {
            ui.label(RichText::new("(no output)").small().color(theme.text_dim));
        }
        if let Some(output) = &result.output {
            ui.label(RichText::new(output).monospace());
        }
        if let Some(error) = &result.error {
            ui.label(RichText::new(error).monospace().color(theme.danger));
        }
        if let Some(data) = &result.image_base64 {
            let slot = self.images.entry(index).or_insert_with(|| {
                match decode_png_base64(data) {
                    Ok(image) => ImageSlot::Ready(ui.ctx().load_texture(
                        format!("tool-image-{index}"),
                        image,
                        TextureOptions::LINEAR,
                    )),
                    Err(err) => {
                        tracing::warn!(tool_use_id = %result.tool_use_id, "image decode failed: {err}");
                        ImageSlot::Failed(err.to_string())
                    }
                }
            });
            match slot {
                ImageSlot::Ready(texture) => {
                    let sized = egui::load::SizedTexture::from_handle(texture);
                    ui.add(egui::Image::from_texture(sized).max_width(theme.image_max_width));
                }
                ImageSlot::Failed(reason) => {
                    ui.label(
                        RichText::new(format!("[image could not be shown: {reason}]"))
                            .small()
                            .color(theme.text_dim),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR4nGP4z8DwHwAFAAH/iZk9HQAAAABJRU5ErkJggg==";

    #[test]
    fn decodes_png_payload() {
        let image = decode_png_base64(ONE_PIXEL_PNG).expect("fixture png should decode");
        assert_eq!(image.size, [1, 1]);
    }

    #[test]
    fn rejects_bad_base64() {
        let err = decode_png_base64("not base64 at all!").expect_err("should fail");
        assert!(matches!(err, ImageDecodeError::Base64(_)));
    }

    #[test]
    fn rejects_non_png_bytes() {
        let err = decode_png_base64("QQ==").expect_err("single byte is not a png");
        assert!(matches!(err, ImageDecodeError::Image(_)));
    }
}
