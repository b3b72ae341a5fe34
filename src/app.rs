use crate::backend::HttpAgentApi;
use crate::event::AppEvent;
use crate::session::controller::{Phase, SessionController};
use crate::session::SessionId;
use crate::theme::Theme;
use crate::transcript::view::TranscriptView;
use eframe::egui::{self, Color32, RichText, ScrollArea};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use tracing::debug;

pub struct AgentDeskApp {
    rx: Receiver<AppEvent>,
    controller: SessionController<HttpAgentApi>,
    theme: Theme,
    transcript_view: TranscriptView,
    base_url: String,
    input_buffer: String,
    upload_path: String,
    visuals_applied: bool,
}

impl AgentDeskApp {
    pub fn new(
        rx: Receiver<AppEvent>,
        controller: SessionController<HttpAgentApi>,
        base_url: String,
    ) -> Self {
        Self {
            rx,
            controller,
            theme: Theme::default(),
            transcript_view: TranscriptView::default(),
            base_url,
            input_buffer: String::new(),
            upload_path: String::new(),
            visuals_applied: false,
        }
    }

    fn phase_label(&self) -> (String, Color32) {
        match self.controller.phase() {
            Phase::NoSession => ("No session".to_string(), self.theme.text_dim),
            Phase::SessionSelected(session_id) => {
                (format!("Session {session_id}"), self.theme.success)
            }
            Phase::Streaming(session_id) => (
                format!("Session {session_id}: agent working..."),
                self.theme.warning,
            ),
        }
    }

    fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.controller.apply(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("event channel disconnected");
                    break;
                }
            }
        }

        if let Some(text) = self.controller.take_retry_text() {
            if self.input_buffer.trim().is_empty() {
                self.input_buffer = text;
            }
        }
    }

    fn submit_prompt(&mut self, ctx: &egui::Context) {
        if self.controller.submit(&self.input_buffer).is_ok() {
            self.input_buffer.clear();
        }
        ctx.request_repaint();
    }

    fn upload_selected_file(&mut self) {
        let path = self.upload_path.trim();
        if path.is_empty() {
            return;
        }
        self.controller.upload_file(&PathBuf::from(path));
        self.upload_path.clear();
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        let (phase_label, phase_color) = self.phase_label();
        egui::TopBottomPanel::top("top_bar")
            .frame(self.theme.panel_frame(self.theme.background))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.strong("AgentDesk");
                    ui.separator();
                    ui.label(RichText::new(phase_label).color(phase_color));
                    ui.separator();
                    ui.label(RichText::new(&self.base_url).color(self.theme.text_dim));
                });
            });
    }

    fn render_left_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("sessions_panel")
            .resizable(true)
            .default_width(220.0)
            .frame(self.theme.panel_frame(self.theme.panel))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("New Task").clicked() {
                        self.controller.create_session();
                    }
                    if ui.button("Refresh").clicked() {
                        self.controller.refresh_sessions();
                    }
                });
                ui.separator();
                ui.strong("Sessions");

                let active = self.controller.active_session().cloned();
                let mut clicked_session: Option<SessionId> = None;
                ScrollArea::vertical()
                    .id_salt("session_list")
                    .show(ui, |ui| {
                        if self.controller.sessions().is_empty() {
                            ui.label(RichText::new("No sessions yet").color(self.theme.text_dim));
                        }
                        for session in self.controller.sessions().iter().rev() {
                            let selected = active.as_ref() == Some(&session.session_id);
                            let mut button = egui::Button::new(session.title())
                                .min_size(egui::vec2(ui.available_width(), 0.0));
                            if selected {
                                button = button.fill(self.theme.selected_session);
                            }
                            let response = ui.add(button);
                            let response = match &session.created_at {
                                Some(created_at) => response.on_hover_text(created_at.as_str()),
                                None => response,
                            };
                            if response.clicked() {
                                clicked_session = Some(session.session_id.clone());
                            }
                        }
                    });

                if let Some(session_id) = clicked_session {
                    self.controller.select_session(session_id);
                }
            });
    }

    fn render_center_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(self.theme.panel_frame(self.theme.background))
            .show(ctx, |ui| {
                let transcript_height = (ui.available_height() - 210.0).max(120.0);
                let scroll_requested = self.controller.transcript_mut().take_scroll_request();
                ScrollArea::vertical()
                    .id_salt("chat_transcript")
                    .max_height(transcript_height)
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        if self.controller.transcript().is_empty() {
                            ui.label(
                                RichText::new("No messages yet").color(self.theme.text_dim),
                            );
                        }
                        self.transcript_view
                            .show(ui, &self.theme, self.controller.transcript());

                        if scroll_requested {
                            ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                        }
                    });

                ui.separator();
                egui::CollapsingHeader::new("Diagnostics")
                    .default_open(false)
                    .show(ui, |ui| {
                        ScrollArea::vertical()
                            .id_salt("diagnostics_log")
                            .max_height(90.0)
                            .stick_to_bottom(true)
                            .show(ui, |ui| {
                                for entry in self.controller.diagnostics() {
                                    ui.label(RichText::new(entry).small().monospace());
                                }
                            });
                    });

                if let Some(notice) = self.controller.notice() {
                    ui.label(RichText::new(notice).color(self.theme.warning));
                }

                self.render_composer(ui, ctx);
            });
    }

    fn render_composer(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let hint = if self.controller.is_streaming() {
            "Agent is working... sending restarts the stream"
        } else {
            "Type a message..."
        };

        let mut send_now = false;
        self.theme.composer_frame().show(ui, |ui| {
            ui.horizontal(|ui| {
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.input_buffer)
                        .desired_width(ui.available_width() - 70.0)
                        .hint_text(hint),
                );
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    send_now = true;
                }

                send_now |= ui
                    .add_enabled(
                        !self.input_buffer.trim().is_empty(),
                        egui::Button::new("Send"),
                    )
                    .clicked();
            });

            ui.add_space(self.theme.gap_small);
            ui.horizontal(|ui| {
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.upload_path)
                        .desired_width(ui.available_width() - 70.0)
                        .hint_text("Path of a file to upload"),
                );
                let mut upload_now =
                    response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                upload_now |= ui
                    .add_enabled(
                        !self.upload_path.trim().is_empty(),
                        egui::Button::new("Upload"),
                    )
                    .clicked();
                if upload_now {
                    self.upload_selected_file();
                }
            });
        });

        if send_now {
            self.submit_prompt(ctx);
        }
    }
}

impl eframe::App for AgentDeskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.visuals_applied {
            self.theme.apply_visuals(ctx);
            self.visuals_applied = true;
        }
        self.drain_events();
        self.render_top_bar(ctx);
        self.render_left_panel(ctx);
        self.render_center_panel(ctx);
    }
}
