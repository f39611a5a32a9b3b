//! Multi-window scenarios driven end to end through the headless backend

mod multi_window;
