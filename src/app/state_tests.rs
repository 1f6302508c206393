// ABOUTME: Tests for AppState navigation, command line parsing and the App action loop

#[cfg(test)]
mod tests {
    use crate::app::state::{App, AppState, AsyncAction, FocusArea, NotificationType, Tab};
    use crate::config::InspectorSettings;
    use crate::mcp::test_support::{FakeFactory, Script, server};
    use crate::mcp::{ConnectionManager, ConnectionStatus};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn state() -> AppState {
        AppState::new(vec![server("alpha"), server("beta"), server("gamma")])
    }

    #[test]
    fn test_server_selection_wraps() {
        let mut state = state();
        state.previous_server();
        assert_eq!(state.selected_name().as_deref(), Some("gamma"));
        state.next_server();
        assert_eq!(state.selected_name().as_deref(), Some("alpha"));
    }

    #[test]
    fn test_focus_cycle_depends_on_tab() {
        let mut state = state();
        state.focus_next();
        state.focus_next();
        assert_eq!(state.focus, FocusArea::TabContent);
        state.focus_next();
        assert_eq!(state.focus, FocusArea::ServerList);

        state.select_tab(Tab::History);
        state.focus_previous();
        assert_eq!(state.focus, FocusArea::HistoryDetail);
        state.focus_previous();
        assert_eq!(state.focus, FocusArea::HistoryList);

        // Switching away from History maps the content focus back
        state.select_tab(Tab::Tools);
        assert_eq!(state.focus, FocusArea::TabContent);
    }

    #[test]
    fn test_tab_cycle_and_accelerators() {
        assert_eq!(Tab::Resources.previous(), Tab::History);
        assert_eq!(Tab::History.next(), Tab::Resources);
        assert_eq!(Tab::from_key('n'), Some(Tab::Notifications));
        assert_eq!(Tab::from_key('x'), None);
    }

    #[test]
    fn test_connect_only_queued_when_idle() {
        let mut state = state();
        state.request_connect();
        assert_eq!(
            state.pending_async_action,
            Some(AsyncAction::Connect("alpha".to_string()))
        );

        state.pending_async_action = None;
        state.servers[0].state.status = ConnectionStatus::Connecting;
        state.request_connect();
        assert_eq!(state.pending_async_action, None);
        state.request_disconnect();
        assert_eq!(
            state.pending_async_action,
            Some(AsyncAction::Disconnect("alpha".to_string()))
        );
    }

    #[test]
    fn test_connect_command_selects_server() {
        let mut state = state();
        state.open_command();
        for c in "/connect beta".chars() {
            state.command_push(c);
        }
        state.submit_command();

        assert_eq!(state.command_input, None);
        assert_eq!(state.selected_name().as_deref(), Some("beta"));
        assert_eq!(
            state.pending_async_action,
            Some(AsyncAction::Connect("beta".to_string()))
        );
    }

    #[test]
    fn test_unknown_commands_raise_errors() {
        let mut state = state();
        state.execute_command("connect ghost");
        state.execute_command("/frobnicate");
        assert_eq!(state.notifications.len(), 2);
        assert!(state
            .notifications
            .iter()
            .all(|n| n.notification_type == NotificationType::Error));
        assert_eq!(state.pending_async_action, None);
    }

    #[test]
    fn test_quit_and_help_commands() {
        let mut state = state();
        state.execute_command("help");
        assert!(state.help_visible);
        state.execute_command("/exit");
        assert!(state.should_quit);
    }

    #[test]
    fn test_backspace_on_empty_input_closes_command_line() {
        let mut state = state();
        state.open_command();
        state.command_push('x');
        state.command_backspace();
        assert_eq!(state.command_input.as_deref(), Some(""));
        state.command_backspace();
        assert_eq!(state.command_input, None);
    }

    #[test]
    fn test_refresh_requires_connection() {
        let mut state = state();
        state.request_refresh();
        assert_eq!(state.pending_async_action, None);
        assert_eq!(state.notifications[0].notification_type, NotificationType::Warning);
    }

    #[tokio::test]
    async fn test_app_tick_runs_queued_connect() {
        let factory = FakeFactory::default().with(
            "alpha",
            Script::with_capabilities(json!({"tools": {}}))
                .result("tools/list", json!({"tools": [{"name": "echo"}, {"name": "add"}]})),
        );
        let manager = ConnectionManager::new(
            vec![server("alpha")],
            &InspectorSettings::default(),
            Arc::new(factory),
        );
        let mut app = App::new(manager);
        app.state.request_connect();
        app.tick();

        for _ in 0..200 {
            app.tick();
            if app.state.servers[0].state.status == ConnectionStatus::Connected
                && !app.state.notifications.is_empty()
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(app.state.servers[0].state.status, ConnectionStatus::Connected);
        assert_eq!(app.state.item_count(Tab::Tools), 2);
        assert!(!app.state.history.is_empty());
        assert_eq!(
            app.state.notifications[0].notification_type,
            NotificationType::Success
        );
        assert!(app.needs_ui_refresh());
        assert!(!app.needs_ui_refresh());
    }

    #[tokio::test]
    async fn test_refresh_of_disconnected_server_is_not_reported_as_success() {
        let factory = FakeFactory::default().with("alpha", Script::with_capabilities(json!({})));
        let manager = ConnectionManager::new(
            vec![server("alpha")],
            &InspectorSettings::default(),
            Arc::new(factory),
        );
        let mut app = App::new(manager);
        app.state.pending_async_action = Some(AsyncAction::Refresh("alpha".to_string()));

        for _ in 0..200 {
            app.tick();
            if !app.state.notifications.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let notification = &app.state.notifications[0];
        assert_eq!(notification.notification_type, NotificationType::Info);
        assert_eq!(notification.message, "Nothing refreshed, alpha is not connected");
        assert_eq!(app.state.servers[0].state.status, ConnectionStatus::Disconnected);
    }
}
