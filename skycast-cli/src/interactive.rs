//! The default mode: bootstrap a session, then loop on a menu of actions.

use inquire::{InquireError, Select, Text};
use skycast_core::{Config, IpLocator, Session, Store, ViewMode, WeatherClient};
use std::fmt;

use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Search,
    PickSaved,
    ToggleUnit,
    ToggleTheme,
    ToggleView,
    ClearSaved,
    Quit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Search => "Search for a location",
            Action::PickSaved => "Show a saved location",
            Action::ToggleUnit => "Switch temperature unit",
            Action::ToggleTheme => "Switch theme",
            Action::ToggleView => "Switch daily/hourly view",
            Action::ClearSaved => "Clear saved locations",
            Action::Quit => "Quit",
        })
    }
}

fn menu(session: &Session) -> Vec<Action> {
    let mut actions = vec![Action::Search];
    if !session.saved_locations().is_empty() {
        actions.push(Action::PickSaved);
    }
    actions.extend([Action::ToggleUnit, Action::ToggleTheme, Action::ToggleView]);
    if !session.saved_locations().is_empty() {
        actions.push(Action::ClearSaved);
    }
    actions.push(Action::Quit);
    actions
}

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    let api_key = config.resolve_api_key()?;
    let client = WeatherClient::new(api_key)?;
    let locator = IpLocator::new()?;
    let store = Store::open()?;

    let mut session = Session::new(Box::new(client), Box::new(locator), store);
    session.bootstrap().await;
    println!("{}\n", render::session_view(&session));

    loop {
        let choice = match Select::new("What next?", menu(&session)).prompt() {
            Ok(choice) => choice,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        match choice {
            Action::Search => match Text::new("Location:").prompt() {
                Ok(query) => session.search(&query).await,
                Err(InquireError::OperationCanceled) => continue,
                Err(e) => return Err(e.into()),
            },
            Action::PickSaved => {
                let names: Vec<String> =
                    session.saved_locations().iter().map(str::to_owned).collect();
                match Select::new("Saved locations", names).prompt() {
                    Ok(name) => session.select_saved(&name).await,
                    Err(InquireError::OperationCanceled) => continue,
                    Err(e) => return Err(e.into()),
                }
            }
            Action::ToggleUnit => session.toggle_unit(),
            Action::ToggleTheme => session.toggle_theme(),
            Action::ToggleView => {
                let next = match session.preferences().view {
                    ViewMode::Daily => ViewMode::Hourly,
                    ViewMode::Hourly => ViewMode::Daily,
                };
                session.set_view_mode(next);
            }
            Action::ClearSaved => session.clear_saved(),
            Action::Quit => break,
        }

        println!("{}\n", render::session_view(&session));
    }

    Ok(())
}
