use crate::app::{App, MenuItem};
use crate::state::messages::NetworkRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    let mut guard = app.lock().await;

    // Ctrl-C always quits, even while typing.
    if key_event.code == Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL) {
        crate::cleanup_terminal();
        std::process::exit(0);
    }

    if guard.state.confirm_reset {
        let confirmed = matches!(key_event.code, Char('y') | Char('Y'));
        let request = guard.answer_reset(confirmed);
        drop(guard);
        send(network_requests, request).await;
        return;
    }

    if guard.state.is_typing() {
        let request = match key_event.code {
            KeyCode::Enter => guard.submit_player(),
            KeyCode::Esc => {
                guard.state.players.composing = false;
                guard.state.players.input.clear();
                None
            }
            KeyCode::Backspace => {
                guard.state.players.input.pop();
                None
            }
            Char(c) => {
                guard.state.players.input.push(c);
                None
            }
            _ => None,
        };
        drop(guard);
        send(network_requests, request).await;
        return;
    }

    let request = match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        // Quit
        (_, Char('q'), _) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching
        (_, Char('1'), _) => {
            guard.update_tab(MenuItem::Rankings);
            None
        }
        (_, Char('2'), _) => {
            guard.update_tab(MenuItem::Games);
            None
        }
        (_, Char('3'), _) => {
            guard.update_tab(MenuItem::Players);
            None
        }
        (_, Char('?'), _) => {
            guard.update_tab(MenuItem::Help);
            None
        }
        (MenuItem::Help, KeyCode::Esc, _) => {
            guard.exit_help();
            None
        }

        // Add-game form
        (MenuItem::Games, Char('j') | KeyCode::Down | KeyCode::Tab, _) => {
            guard.form_next_field();
            None
        }
        (MenuItem::Games, Char('k') | KeyCode::Up | KeyCode::BackTab, _) => {
            guard.form_prev_field();
            None
        }
        (MenuItem::Games, Char('l') | KeyCode::Right | Char('+'), _) => {
            guard.form_change(true);
            None
        }
        (MenuItem::Games, Char('h') | KeyCode::Left | Char('-'), _) => {
            guard.form_change(false);
            None
        }
        (MenuItem::Games, KeyCode::Enter, _) => guard.submit_game(),

        // Roster management
        (MenuItem::Players, Char('j') | KeyCode::Down, _) => {
            guard.players_down();
            None
        }
        (MenuItem::Players, Char('k') | KeyCode::Up, _) => {
            guard.players_up();
            None
        }
        (MenuItem::Players, Char('a') | Char('i'), _) => {
            guard.start_composing();
            None
        }
        (MenuItem::Players, Char('d') | KeyCode::Delete, _) => guard.remove_selected_player(),

        // Global
        (_, Char('R'), _) => {
            guard.request_reset();
            None
        }
        (_, Char('u'), _) => Some(NetworkRequest::Reload),
        (_, Char('f'), _) => {
            guard.toggle_full_screen();
            None
        }
        (_, Char('"'), _) => {
            guard.toggle_show_logs();
            None
        }

        _ => None,
    };

    drop(guard);
    send(network_requests, request).await;
}

async fn send(network_requests: &mpsc::Sender<NetworkRequest>, request: Option<NetworkRequest>) {
    if let Some(request) = request {
        let _ = network_requests.send(request).await;
    }
}
