use std::cell::RefCell;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::info;

use crate::engine::Variant;
use crate::games::GameScreen;
use crate::scores::HighScores;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    Home,
    Game(Variant),
}

impl Tab {
    pub fn all() -> Vec<Tab> {
        std::iter::once(Tab::Home)
            .chain(Variant::all().iter().copied().map(Tab::Game))
            .collect()
    }

    pub fn title(&self) -> String {
        match self {
            Tab::Home => " Home ".to_string(),
            Tab::Game(variant) => format!(" {} ", variant.name()),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::Home => 0,
            Tab::Game(variant) => variant.index() + 1,
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub current_tab: Tab,
    pub selected_game: usize,
    pub high_scores: Rc<RefCell<HighScores>>,
    pub show_high_scores: bool,
    pub player: Option<String>,
    /// The game on the current tab; rebuilt each time a game tab is entered.
    pub screen: Option<GameScreen>,
    seed: Option<u64>,
}

impl App {
    pub fn new(high_scores: HighScores, seed: Option<u64>, player: Option<String>) -> Self {
        Self {
            should_quit: false,
            current_tab: Tab::Home,
            selected_game: 0,
            high_scores: Rc::new(RefCell::new(high_scores)),
            show_high_scores: false,
            player,
            screen: None,
            seed,
        }
    }

    pub fn on_tick(&mut self) {
        if let Some(screen) = self.screen.as_mut() {
            screen.update();
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        // Ctrl+C always quits
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return;
        }

        // Global keys
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') if self.current_tab == Tab::Home => {
                self.quit();
                return;
            }
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.prev_tab();
                } else {
                    self.next_tab();
                }
                return;
            }
            KeyCode::BackTab => {
                self.prev_tab();
                return;
            }
            KeyCode::Esc if self.current_tab != Tab::Home => {
                self.switch_to(Tab::Home);
                return;
            }
            _ => {}
        }

        if self.current_tab == Tab::Home {
            self.handle_home_key(key);
            return;
        }

        // Forward to active game
        if let Some(screen) = self.screen.as_mut() {
            screen.handle_input(key);
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) {
        if !key.modifiers.is_empty() && key.modifiers != KeyModifiers::SHIFT {
            return;
        }
        let count = Variant::all().len();
        match key.code {
            KeyCode::Char(c @ '1'..='9') => {
                let idx = c as usize - '1' as usize;
                if let Some(variant) = Variant::all().get(idx) {
                    self.selected_game = idx;
                    self.switch_to(Tab::Game(*variant));
                }
            }
            KeyCode::Char('h') | KeyCode::Char('H') => {
                self.show_high_scores = !self.show_high_scores;
            }
            KeyCode::Right | KeyCode::Down => {
                self.selected_game = (self.selected_game + 1) % count;
            }
            KeyCode::Left | KeyCode::Up => {
                self.selected_game = (self.selected_game + count - 1) % count;
            }
            KeyCode::Enter => {
                if let Some(variant) = Variant::all().get(self.selected_game) {
                    self.switch_to(Tab::Game(*variant));
                }
            }
            _ => {}
        }
    }

    /// Leaving a game ends its session, which submits the score.
    fn switch_to(&mut self, tab: Tab) {
        if let Some(mut screen) = self.screen.take() {
            screen.leave();
        }
        self.current_tab = tab;
        if let Tab::Game(variant) = tab {
            self.selected_game = variant.index();
            self.show_high_scores = false;
            self.screen = Some(GameScreen::new(variant, self.seed, Rc::clone(&self.high_scores)));
            info!(game = %variant, "entered game");
        }
    }

    fn quit(&mut self) {
        if let Some(mut screen) = self.screen.take() {
            screen.leave();
        }
        self.should_quit = true;
    }

    fn next_tab(&mut self) {
        let tabs = Tab::all();
        let idx = self.current_tab.index();
        self.switch_to(tabs[(idx + 1) % tabs.len()]);
    }

    fn prev_tab(&mut self) {
        let tabs = Tab::all();
        let idx = self.current_tab.index();
        self.switch_to(tabs[(idx + tabs.len() - 1) % tabs.len()]);
    }
}
