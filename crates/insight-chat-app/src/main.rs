#![warn(missing_docs)]
//! # insight-chat-app binary
//!
//! Terminal front-end for insight-chat: a login prompt, then a line-oriented
//! chat where `:` commands pick features and files and plain lines submit
//! text or URLs.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use insight_chat_app::{AppConfig, AppError, ChatController, app_version, init_tracing};
use insight_chat_core::{Feature, InputKind};
use insight_chat_transport::HttpApi;
use insight_chat_ui::{
    FeaturePanel, PASSWORD_PROMPT, USERNAME_PROMPT, panel_placeholder, render_transcript,
};

const HELP: &str = "\
commands:
  :features            list analysis features
  :select <feature>    switch feature (clears the conversation)
  :mode text|url|file  document input mode
  :image <path>        analyze an image
  :doc <path>          analyze a .pdf/.docx/.doc document
  :clear               clear the conversation
  :status              session and backend status
  :logout              end the session
  :quit                exit
any other line is submitted as text or url in document analysis
the login prompt echoes the password; use a private terminal";

/// CLI entry point.
fn main() {
    if let Err(error) = run() {
        tracing::error!(stage = "startup", action = "fatal", error = %error, "insight-chat stopped");
        eprintln!("insight-chat: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    init_tracing(&config.log_filter);
    tracing::info!(stage = "startup", action = "begin", version = app_version(), api = %config.api_base_url, "insight-chat starting");

    let api = Arc::new(HttpApi::new(config.api_base_url.clone())?);
    let mut controller = ChatController::new(api.clone(), api, app_version());

    match controller.health() {
        Ok(health) => tracing::info!(stage = "startup", action = "health", status = %health.status, "backend reachable"),
        Err(error) => tracing::warn!(stage = "startup", action = "health", error = %error, "backend health probe failed"),
    }
    controller.check_status();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut shell = Shell::default();
    println!("insight-chat {}", app_version());

    loop {
        if !controller.state().is_authenticated() {
            if !shell.login_prompt(&mut controller, &mut lines) {
                return Ok(());
            }
            continue;
        }

        prompt(&controller);
        let Some(Ok(line)) = lines.next() else {
            return Ok(());
        };
        if !shell.handle_line(&mut controller, line.trim_end()) {
            return Ok(());
        }
        shell.render(&controller);
    }
}

#[derive(Default)]
struct Shell {
    shown: usize,
}

impl Shell {
    /// Returns `false` when stdin is exhausted.
    fn login_prompt(
        &mut self,
        controller: &mut ChatController,
        lines: &mut impl Iterator<Item = io::Result<String>>,
    ) -> bool {
        println!("Log in to continue.");
        let Some(username) = ask(USERNAME_PROMPT, lines) else {
            return false;
        };
        let Some(password) = ask(PASSWORD_PROMPT, lines) else {
            return false;
        };

        controller.set_credentials(username, password);
        match controller.login() {
            Ok(()) => {
                self.shown = 0;
                println!("Logged in.");
                print_features();
                self.render(controller);
            }
            Err(_) => {
                if let Some(error) = &controller.state().login.error {
                    println!("{error}");
                }
            }
        }
        true
    }

    /// Returns `false` when the user asked to quit.
    fn handle_line(&mut self, controller: &mut ChatController, line: &str) -> bool {
        let (command, argument) = match line.split_once(' ') {
            Some((command, argument)) => (command, argument.trim()),
            None => (line, ""),
        };

        let result = match command {
            ":quit" | ":q" => return false,
            ":help" => {
                println!("{HELP}");
                Ok(())
            }
            ":features" => {
                print_features();
                Ok(())
            }
            ":select" => {
                controller.select_feature(argument);
                self.shown = 0;
                describe_panel(controller);
                Ok(())
            }
            ":mode" => match InputKind::parse(argument) {
                Some(kind) => {
                    controller.set_input_kind(kind);
                    Ok(())
                }
                None => {
                    println!("mode must be text, url or file");
                    Ok(())
                }
            },
            ":image" => self.upload(controller, argument, true),
            ":doc" => self.upload(controller, argument, false),
            ":clear" => {
                controller.clear_chat();
                self.shown = 0;
                Ok(())
            }
            ":status" => {
                print_status(controller);
                Ok(())
            }
            ":logout" => {
                controller.logout();
                self.shown = 0;
                println!("Logged out.");
                Ok(())
            }
            _ if line.starts_with(':') => {
                println!("unknown command; :help lists commands");
                Ok(())
            }
            _ => {
                controller.set_staged_text(line);
                match controller.begin_text_submit() {
                    Ok(Some(pending)) => {
                        self.render(controller);
                        controller.dispatch(pending);
                        Ok(())
                    }
                    Ok(None) => Ok(()),
                    Err(error) => Err(error),
                }
            }
        };

        if let Err(error) = result {
            println!("{error}");
        }
        true
    }

    fn upload(
        &mut self,
        controller: &mut ChatController,
        argument: &str,
        image: bool,
    ) -> Result<(), insight_chat_app::ControllerError> {
        if argument.is_empty() {
            println!("a file path is required");
            return Ok(());
        }
        let path = Path::new(argument);
        if image {
            controller.upload_image(path)
        } else {
            controller.upload_document_file(path)
        }
    }

    fn render(&mut self, controller: &ChatController) {
        let lines = render_transcript(controller.state());
        if lines.len() < self.shown {
            self.shown = 0;
        }
        for line in &lines[self.shown..] {
            println!("{line}");
        }
        // The busy indicator is re-rendered until the reply replaces it.
        self.shown = if controller.state().busy {
            lines.len().saturating_sub(1)
        } else {
            lines.len()
        };
    }
}

fn ask(label: &str, lines: &mut impl Iterator<Item = io::Result<String>>) -> Option<String> {
    print!("{label}");
    let _ = io::stdout().flush();
    lines.next()?.ok().map(|line| line.trim_end().to_string())
}

fn prompt(controller: &ChatController) {
    let feature = controller
        .state()
        .feature
        .map(Feature::id)
        .unwrap_or("no feature");
    print!("[{feature}]> ");
    let _ = io::stdout().flush();
}

fn print_features() {
    for feature in Feature::ALL {
        let note = if feature.is_available() { "" } else { " (coming soon)" };
        println!("  {:<18} {}{note}", feature.id(), feature.label());
    }
}

fn describe_panel(controller: &ChatController) {
    let panel = controller.state().panel();
    if let Some(placeholder) = panel_placeholder(panel) {
        println!("{placeholder}");
        return;
    }
    match panel {
        FeaturePanel::ImageUpload => println!("Use :image <path> to analyze an image."),
        FeaturePanel::DocumentInput(_) => {
            println!("Use :doc <path>, or :mode url / :mode text and type a line.")
        }
        FeaturePanel::EmptyState | FeaturePanel::ComingSoon(_) => {}
    }
}

fn print_status(controller: &ChatController) {
    let state = controller.state();
    let user = controller
        .session()
        .user()
        .map(|user| user.username.as_str())
        .unwrap_or("unknown");
    println!("version: {}", state.version);
    println!("user: {user}");
    println!("auth: {:?}", state.auth);
    println!("messages: {}", state.log.len());
    match controller.health() {
        Ok(health) => println!(
            "backend: {}{}",
            health.status,
            health
                .message
                .map(|message| format!(" ({message})"))
                .unwrap_or_default()
        ),
        Err(error) => println!("backend: unreachable ({error})"),
    }
}
