pub mod button_task;
pub mod display_task;
pub mod idle_task;
pub mod power_source_task;
pub mod presence_task;
