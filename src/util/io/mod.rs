pub mod amqp;
pub mod bus;
pub mod gpio;

/// Fanout topic carrying inbound control messages.
pub const TOPIC_CONTROL: &str = "gpiobutton_ctrl";
/// Fanout topic carrying press events.
pub const TOPIC_EVENTS: &str = "gpiobutton_events";

pub fn get_all_topics() -> Vec<String> {
    vec![
        TOPIC_CONTROL.to_string(),
        TOPIC_EVENTS.to_string(),
    ]
}
