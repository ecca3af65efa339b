//! Choice of the `is_awesome` flag for apps whose data does not carry one
//!
//! The historic behavior is a coin flip per app. It stays the default but
//! is a named, swappable step.

use crate::models::App;
use rand::Rng;

pub trait AwesomeFlag: Send {
    fn pick(&mut self, app: &App) -> bool;
}

/// Fair coin flip per app
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomAwesome;

impl AwesomeFlag for RandomAwesome {
    fn pick(&mut self, _app: &App) -> bool {
        rand::thread_rng().gen_bool(0.5)
    }
}

/// Same answer for every app
#[derive(Debug, Clone, Copy)]
pub struct FixedAwesome(pub bool);

impl AwesomeFlag for FixedAwesome {
    fn pick(&mut self, _app: &App) -> bool {
        self.0
    }
}

/// Flag to store: the source value when present, otherwise the strategy's pick
pub fn resolve_is_awesome(app: &App, flag: &mut dyn AwesomeFlag) -> bool {
    app.is_awesome.unwrap_or_else(|| flag.pick(app))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(is_awesome: Option<bool>) -> App {
        App {
            name: Some("Notes".to_string()),
            genre: Some("Productivity".to_string()),
            rating: Some(4.5),
            version: Some("1.0".to_string()),
            size_bytes: Some(1024),
            is_awesome,
        }
    }

    #[test]
    fn test_source_value_wins() {
        let mut flag = FixedAwesome(false);
        assert!(resolve_is_awesome(&app(Some(true)), &mut flag));
    }

    #[test]
    fn test_strategy_used_when_absent() {
        let mut flag = FixedAwesome(true);
        assert!(resolve_is_awesome(&app(None), &mut flag));
    }

    #[test]
    fn test_random_produces_both_values() {
        let mut flag = RandomAwesome;
        let app = app(None);
        let picks: Vec<bool> = (0..200).map(|_| flag.pick(&app)).collect();
        assert!(picks.contains(&true));
        assert!(picks.contains(&false));
    }
}
