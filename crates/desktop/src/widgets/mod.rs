pub mod action_button;
pub mod file_row;
pub mod legend;
pub mod person_card;
