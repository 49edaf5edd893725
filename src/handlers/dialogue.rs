use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::error::{Result, SchedulerError};
use crate::handlers::terminal::Terminal;
use crate::models::appointment::EventDraft;
use crate::models::office_hours::WeeklyHours;
use crate::models::slot::ResolvedRange;
use crate::models::transcript::{ChatRole, SessionContext};
use crate::service::availability::AvailabilityChecker;
use crate::service::calendar_service::CalendarClient;
use crate::service::openai_service::OpenAIClient;
use crate::service::routing::{Intent, is_negative, route_intent};
use crate::service::slot_resolver::SlotResolver;

const INPUT_PROMPT: &str = ">";
const DEFAULT_TITLE: &str = "Appointment";
const BACKEND_FAILURE: &str = "Sorry, something went wrong while talking to the calendar. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    Greeting,
    ActionSelect,
    Scheduling,
    Updating,
    Deleting,
    Listing,
    Ending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    Aborted(SchedulerError),
    GaveUp { attempts: u32 },
    /// Input ended mid-action.
    Closed,
}

#[derive(Debug, Clone, Copy)]
pub enum Clock {
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(at) => *at,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DialogueSettings {
    pub timezone: Tz,
    pub slot_minutes: u32,
    pub max_attempts: u32,
}

/// What the assistant should say next. Each cue is a system instruction for
/// the text generator plus a fixed sentence used when generation fails.
#[derive(Debug, Clone)]
enum Cue {
    Greet,
    AskAction,
    AskSlot,
    AskNewSlot,
    SlotAccepted { when: String },
    Unavailable { reason: String },
    FormatHint,
    GaveUp { attempts: u32 },
    AskEventId { purpose: &'static str },
    Updated,
    AskDate,
    EventsFound { date: NaiveDate },
    NoEvents { date: NaiveDate },
    AskContinue,
    Farewell,
}

impl Cue {
    fn instruction(&self) -> String {
        match self {
            Cue::Greet => "Greet the user and inform that you are an appointment booking assistant. Ask the user to input their name.".to_string(),
            Cue::AskAction => "Ask the user if they would like to schedule, update, delete or list appointments.".to_string(),
            Cue::AskSlot => "Ask the user to enter the day and time they would like to schedule the appointment (e.g., Tue 2:00pm).".to_string(),
            Cue::AskNewSlot => "Ask the user to enter the new day and time for the appointment (e.g., Tue 2:00pm).".to_string(),
            Cue::SlotAccepted { when } => format!("Generate a polite confirmation message for the user with an appointment slot on {when}."),
            Cue::Unavailable { reason } => format!("Tell the user the requested time slot is not available ({reason}) and ask for another one."),
            Cue::FormatHint => "Ask the user to enter a valid day followed by a time in the format 'Day H:MMam/pm', for example Tue 2:00pm.".to_string(),
            Cue::GaveUp { attempts } => format!("Tell the user that no slot could be booked after {attempts} attempts and that they can try again later."),
            Cue::AskEventId { purpose } => format!("Ask the user to enter the event ID of the appointment they want to {purpose}."),
            Cue::Updated => "Tell the user that the event is updated.".to_string(),
            Cue::AskDate => "Ask the user to enter the date (YYYY-MM-DD) to list appointments for.".to_string(),
            Cue::EventsFound { date } => format!("Tell the user the events of {date} are listed below."),
            Cue::NoEvents { date } => format!("Tell the user there are no events on {date}."),
            Cue::AskContinue => "Ask the user whether they would like to do any other task (yes/no).".to_string(),
            Cue::Farewell => "Thank the user and say goodbye.".to_string(),
        }
    }

    fn fallback(&self) -> String {
        match self {
            Cue::Greet => "Hello! I'm your appointment booking assistant. What's your name?".to_string(),
            Cue::AskAction => "Would you like to schedule, update, delete or list appointments?".to_string(),
            Cue::AskSlot => "Which day and time would you like (e.g., Tue 2:00pm)?".to_string(),
            Cue::AskNewSlot => "Which new day and time would you like (e.g., Tue 2:00pm)?".to_string(),
            Cue::SlotAccepted { when } => format!("Great, {when} is available."),
            Cue::Unavailable { reason } => format!("Sorry, that time slot is not available: {reason}."),
            Cue::FormatHint => "Please enter a valid day followed by time in the format 'Day H:MMam/pm'. Example: Tue 2:00pm".to_string(),
            Cue::GaveUp { attempts } => format!("Sorry, I couldn't book a slot after {attempts} attempts. Please try again later."),
            Cue::AskEventId { purpose } => format!("Please enter the event ID of the appointment you want to {purpose}."),
            Cue::Updated => "Your appointment has been updated.".to_string(),
            Cue::AskDate => "Which date (YYYY-MM-DD) should I list appointments for?".to_string(),
            Cue::EventsFound { date } => format!("Here are the appointments on {date}:"),
            Cue::NoEvents { date } => format!("There are no appointments on {date}."),
            Cue::AskContinue => "Would you like to do anything else? (yes/no)".to_string(),
            Cue::Farewell => "Thank you, goodbye!".to_string(),
        }
    }
}

/// One interactive booking session.
pub struct Dialogue {
    openai: Arc<dyn OpenAIClient>,
    calendar: Arc<dyn CalendarClient>,
    hours: WeeklyHours,
    settings: DialogueSettings,
    clock: Clock,
    context: SessionContext,
    outcomes: Vec<(DialogueState, ActionOutcome)>,
}

impl Dialogue {
    pub fn new(
        openai: Arc<dyn OpenAIClient>,
        calendar: Arc<dyn CalendarClient>,
        hours: WeeklyHours,
        settings: DialogueSettings,
        clock: Clock,
    ) -> Self {
        Self {
            openai,
            calendar,
            hours,
            settings,
            clock,
            context: SessionContext::new(),
            outcomes: Vec::new(),
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Finished actions in the order they ran.
    pub fn outcomes(&self) -> &[(DialogueState, ActionOutcome)] {
        &self.outcomes
    }

    pub async fn run(&mut self, terminal: &mut dyn Terminal) {
        let mut state = DialogueState::Greeting;
        loop {
            debug!(?state, turns = self.context.transcript().len(), "dialogue step");
            state = match state {
                DialogueState::Greeting => self.greet(terminal).await,
                DialogueState::ActionSelect => self.select_action(terminal).await,
                DialogueState::Scheduling => {
                    let outcome = self.schedule(terminal).await;
                    self.finish_action(state, outcome, terminal).await
                }
                DialogueState::Updating => {
                    let outcome = self.update(terminal).await;
                    self.finish_action(state, outcome, terminal).await
                }
                DialogueState::Deleting => {
                    let outcome = self.delete(terminal).await;
                    self.finish_action(state, outcome, terminal).await
                }
                DialogueState::Listing => {
                    let outcome = self.list(terminal).await;
                    self.finish_action(state, outcome, terminal).await
                }
                DialogueState::Ending => {
                    self.utter(Cue::Farewell, terminal).await;
                    break;
                }
            };
        }
    }

    /// Resolves `"<day> <time>"`, checks office hours and the calendar, and
    /// returns the bookable range. Bookings with id `ignore_id` do not count
    /// as conflicts.
    pub async fn try_slot(&self, input: &str, ignore_id: Option<&str>) -> Result<ResolvedRange> {
        let resolver = SlotResolver::new(&self.hours, self.settings.timezone, self.settings.slot_minutes);
        let range = resolver.resolve_input(self.clock.now(), input)?;
        AvailabilityChecker::new(self.calendar.clone())
            .ensure_free_ignoring(&range, ignore_id)
            .await?;
        Ok(range)
    }

    async fn greet(&mut self, terminal: &mut dyn Terminal) -> DialogueState {
        self.utter(Cue::Greet, terminal).await;
        match self.listen(terminal) {
            Some(name) => {
                self.context.set_user_name(&name);
                DialogueState::ActionSelect
            }
            None => DialogueState::Ending,
        }
    }

    async fn select_action(&mut self, terminal: &mut dyn Terminal) -> DialogueState {
        self.utter(Cue::AskAction, terminal).await;
        let Some(answer) = self.listen(terminal) else {
            return DialogueState::Ending;
        };
        match route_intent(&answer) {
            Intent::Schedule => DialogueState::Scheduling,
            Intent::Update => DialogueState::Updating,
            Intent::Delete => DialogueState::Deleting,
            Intent::List => DialogueState::Listing,
            Intent::Quit => DialogueState::Ending,
            Intent::Unknown => {
                terminal.say("Invalid action. Please choose schedule, update, delete or list.");
                DialogueState::ActionSelect
            }
        }
    }

    async fn finish_action(
        &mut self,
        state: DialogueState,
        outcome: ActionOutcome,
        terminal: &mut dyn Terminal,
    ) -> DialogueState {
        info!(?state, ?outcome, "action finished");
        let closed = outcome == ActionOutcome::Closed;
        self.outcomes.push((state, outcome));
        if closed {
            return DialogueState::Ending;
        }

        self.utter(Cue::AskContinue, terminal).await;
        match self.listen(terminal) {
            Some(answer) if !is_negative(&answer) => DialogueState::ActionSelect,
            _ => DialogueState::Ending,
        }
    }

    async fn schedule(&mut self, terminal: &mut dyn Terminal) -> ActionOutcome {
        terminal.say("Here are our office hours:");
        terminal.say(self.hours.to_string().trim_end());

        let range = match self.acquire_slot(Cue::AskSlot, None, terminal).await {
            Ok(range) => range,
            Err(outcome) => return outcome,
        };
        let Some(title) = self.ask_title(terminal) else {
            return ActionOutcome::Closed;
        };

        let draft = self.draft(title, &range);
        match self.calendar.create_event(&draft).await {
            Ok(created) => {
                terminal.say(&format!("Event ID: {}", created.id));
                if let Some(link) = created.link {
                    terminal.say(&format!("You can view the event here: {}", link));
                }
                ActionOutcome::Completed
            }
            Err(err) => self.abort(err, terminal),
        }
    }

    async fn update(&mut self, terminal: &mut dyn Terminal) -> ActionOutcome {
        let event_id = match self.ask_event_id("update", terminal).await {
            Ok(id) => id,
            Err(outcome) => return outcome,
        };
        let current = match self.calendar.get_event(&event_id).await {
            Ok(current) => current,
            Err(err) => return self.abort(err, terminal),
        };
        terminal.say(&format!(
            "Current booking: {}, {} to {}",
            current.title,
            current.start.to_rfc3339(),
            current.end.to_rfc3339()
        ));

        let range = match self.acquire_slot(Cue::AskNewSlot, Some(&event_id), terminal).await {
            Ok(range) => range,
            Err(outcome) => return outcome,
        };
        let Some(title) = self.ask_title(terminal) else {
            return ActionOutcome::Closed;
        };

        let draft = self.draft(title, &range);
        match self.calendar.update_event(&event_id, &draft).await {
            Ok(link) => {
                self.utter(Cue::Updated, terminal).await;
                if let Some(link) = link {
                    terminal.say(&format!("Event updated: {}", link));
                }
                ActionOutcome::Completed
            }
            Err(err) => self.abort(err, terminal),
        }
    }

    async fn delete(&mut self, terminal: &mut dyn Terminal) -> ActionOutcome {
        let event_id = match self.ask_event_id("delete", terminal).await {
            Ok(id) => id,
            Err(outcome) => return outcome,
        };

        match self.calendar.delete_event(&event_id).await {
            Ok(()) => {
                terminal.say(&format!("Event with ID {} deleted successfully.", event_id));
                ActionOutcome::Completed
            }
            Err(err) => self.abort(err, terminal),
        }
    }

    async fn list(&mut self, terminal: &mut dyn Terminal) -> ActionOutcome {
        let mut date = None;
        for _ in 0..self.settings.max_attempts {
            self.utter(Cue::AskDate, terminal).await;
            let Some(answer) = self.listen(terminal) else {
                return ActionOutcome::Closed;
            };
            match NaiveDate::parse_from_str(answer.trim(), "%Y-%m-%d") {
                Ok(parsed) => {
                    date = Some(parsed);
                    break;
                }
                Err(_) => terminal.say("Please enter the date as YYYY-MM-DD, e.g. 2024-05-14."),
            }
        }
        let Some(date) = date else {
            return self.give_up(terminal).await;
        };

        let events = match self
            .calendar
            .list_events_for_date(date, self.settings.timezone)
            .await
        {
            Ok(events) => events,
            Err(err) => return self.abort(err, terminal),
        };

        if events.is_empty() {
            self.utter(Cue::NoEvents { date }, terminal).await;
        } else {
            self.utter(Cue::EventsFound { date }, terminal).await;
            terminal.say("Title, Event ID, Start time, End Time");
            for event in &events {
                terminal.say(&format!(
                    "{}, {}, {}, {}",
                    event.title,
                    event.id,
                    event.start.to_rfc3339(),
                    event.end.to_rfc3339()
                ));
            }
        }
        ActionOutcome::Completed
    }

    /// Re-prompts until a slot resolves and is free, up to `max_attempts`.
    async fn acquire_slot(
        &mut self,
        ask: Cue,
        ignore_id: Option<&str>,
        terminal: &mut dyn Terminal,
    ) -> std::result::Result<ResolvedRange, ActionOutcome> {
        for attempt in 1..=self.settings.max_attempts {
            self.utter(ask.clone(), terminal).await;
            let Some(input) = self.listen(terminal) else {
                return Err(ActionOutcome::Closed);
            };

            match self.try_slot(&input, ignore_id).await {
                Ok(range) => {
                    let when = format!(
                        "{} at {}",
                        range.start.format("%A, %B %-d"),
                        range.start.format("%-I:%M%P")
                    );
                    self.utter(Cue::SlotAccepted { when }, terminal).await;
                    return Ok(range);
                }
                Err(err) if !err.is_retryable() => return Err(self.abort(err, terminal)),
                Err(err) => {
                    debug!(attempt, error = %err, "slot rejected");
                    self.explain_rejection(&err, terminal).await;
                }
            }
        }
        Err(self.give_up(terminal).await)
    }

    async fn explain_rejection(&mut self, err: &SchedulerError, terminal: &mut dyn Terminal) {
        match err {
            SchedulerError::Parse(_) | SchedulerError::Format(_) => {
                self.utter(Cue::FormatHint, terminal).await;
            }
            SchedulerError::Backend(_) => {
                terminal.say(BACKEND_FAILURE);
                self.utter(
                    Cue::Unavailable {
                        reason: "availability could not be confirmed".to_string(),
                    },
                    terminal,
                )
                .await;
            }
            other => {
                self.utter(
                    Cue::Unavailable {
                        reason: other.to_string(),
                    },
                    terminal,
                )
                .await;
            }
        }
    }

    async fn give_up(&mut self, terminal: &mut dyn Terminal) -> ActionOutcome {
        let attempts = self.settings.max_attempts;
        self.utter(Cue::GaveUp { attempts }, terminal).await;
        ActionOutcome::GaveUp { attempts }
    }

    async fn ask_event_id(
        &mut self,
        purpose: &'static str,
        terminal: &mut dyn Terminal,
    ) -> std::result::Result<String, ActionOutcome> {
        self.utter(Cue::AskEventId { purpose }, terminal).await;
        let Some(answer) = self.listen(terminal) else {
            return Err(ActionOutcome::Closed);
        };
        let id = answer.trim();
        if id.is_empty() {
            terminal.say("No event ID given.");
            return Err(ActionOutcome::Aborted(SchedulerError::Parse(
                "empty event id".to_string(),
            )));
        }
        Ok(id.to_string())
    }

    fn ask_title(&mut self, terminal: &mut dyn Terminal) -> Option<String> {
        let title = terminal.ask("Enter the title of the meeting:")?;
        let title = title.trim();
        self.context.push(ChatRole::User, title);
        Some(if title.is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            title.to_string()
        })
    }

    fn draft(&self, title: String, range: &ResolvedRange) -> EventDraft {
        let description = match self.context.user_name() {
            Some(name) => format!("Booked by {}", name),
            None => "Booked via appointment assistant".to_string(),
        };
        EventDraft {
            title,
            description,
            start: range.start,
            end: range.end,
        }
    }

    fn abort(&self, err: SchedulerError, terminal: &mut dyn Terminal) -> ActionOutcome {
        match &err {
            SchedulerError::NotFound(id) => {
                terminal.say(&format!("No appointment with ID {} was found.", id));
            }
            SchedulerError::Backend(_) => terminal.say(BACKEND_FAILURE),
            other => terminal.say(&format!("Sorry, that didn't work: {}", other)),
        }
        warn!(error = %err, "action aborted");
        ActionOutcome::Aborted(err)
    }

    async fn utter(&mut self, cue: Cue, terminal: &mut dyn Terminal) {
        self.context.push(ChatRole::System, cue.instruction());
        let text = match self.openai.generate(self.context.transcript()).await {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "text generation failed, using fallback");
                cue.fallback()
            }
        };
        self.context.push(ChatRole::Assistant, text.as_str());
        terminal.say(&text);
    }

    fn listen(&mut self, terminal: &mut dyn Terminal) -> Option<String> {
        let answer = terminal.ask(INPUT_PROMPT)?;
        self.context.push(ChatRole::User, answer.as_str());
        Some(answer)
    }
}
