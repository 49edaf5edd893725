use appointmentBot::service::routing::{Intent, is_negative, route_intent};

#[test]
fn routes_schedule_phrases() {
    assert_eq!(route_intent("schedule"), Intent::Schedule);
    assert_eq!(route_intent("I'd like to book a meeting"), Intent::Schedule);
}

#[test]
fn reschedule_is_an_update_not_a_new_booking() {
    assert_eq!(route_intent("reschedule my appointment"), Intent::Update);
    assert_eq!(route_intent("move it please"), Intent::Update);
}

#[test]
fn routes_delete_and_list() {
    assert_eq!(route_intent("cancel my appointment"), Intent::Delete);
    assert_eq!(route_intent("show me the list"), Intent::List);
}

#[test]
fn adjectives_do_not_pick_the_action() {
    assert_eq!(route_intent("list new appointments"), Intent::List);
    assert_eq!(route_intent("show my new bookings"), Intent::List);
    assert_eq!(route_intent("new"), Intent::Unknown);
}

#[test]
fn routes_unknown_when_no_keyword_present() {
    assert_eq!(route_intent("what's the weather"), Intent::Unknown);
    assert_eq!(route_intent("   "), Intent::Unknown);
    assert_eq!(route_intent("schedules"), Intent::Unknown);
}

#[test]
fn only_explicit_no_ends_the_session() {
    assert!(is_negative("no"));
    assert!(!is_negative("yes"));
    assert!(!is_negative(""));
}
