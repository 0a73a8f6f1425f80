pub mod click_log;
pub mod engine;
pub mod gui;
pub mod keymap;
pub mod killswitch;
pub mod matching;
pub mod modals;
pub mod region_select;
pub mod surface;
pub mod templates;
