//! Training console: `EventSource` plumbing and rendering
//!
//! The session decides, this module only performs. Stream handlers and the
//! completion request feed events into the session and apply the effects it
//! returns. Every run gets a number so late events from a replaced stream or
//! an earlier completion request are dropped.

use crate::config;
use crate::dom::{describe, element, log, log_error, set_display};
use panel::{
    ConsoleEffect, ConsoleIds, ConsoleLabels, LogLevel, ReadyState, RunCounter, TerminalLine,
    TrainButton, TrainingSession,
};
use std::cell::RefCell;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    Document, Event, EventSource, HtmlButtonElement, HtmlElement, MessageEvent, RequestInit,
    Response,
};

/// How the train button looks for a given state
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonAppearance {
    /// `None` leaves the current disabled flag alone
    pub disabled: Option<bool>,
    pub label: String,
    pub opacity: Option<&'static str>,
}

pub fn button_appearance(state: TrainButton, labels: &ConsoleLabels) -> ButtonAppearance {
    match state {
        TrainButton::Busy => ButtonAppearance {
            disabled: Some(true),
            label: labels.training.clone(),
            opacity: Some("0.6"),
        },
        TrainButton::Retry => ButtonAppearance {
            disabled: Some(false),
            label: labels.retry.clone(),
            opacity: Some("1"),
        },
        TrainButton::Completed => ButtonAppearance {
            disabled: None,
            label: labels.completed.clone(),
            opacity: None,
        },
    }
}

/// Named event the backend sends when it ends the stream
const CLOSE_EVENT: &str = "close";

/// Closures attached to a live `EventSource`
struct StreamHandlers {
    _message: Closure<dyn FnMut(MessageEvent)>,
    _error: Closure<dyn FnMut(Event)>,
    _open: Closure<dyn FnMut(Event)>,
    close: Closure<dyn FnMut(Event)>,
}

struct Trainer {
    runs: RunCounter,
    session: TrainingSession,
    ids: ConsoleIds,
    source: Option<EventSource>,
    handlers: Option<StreamHandlers>,
    // Closed handlers may still be on the call stack; freed with the trainer
    retired: Vec<StreamHandlers>,
}

impl Trainer {
    fn close_stream(&mut self) {
        if let Some(source) = self.source.take() {
            source.close();
            source.set_onmessage(None);
            source.set_onerror(None);
            source.set_onopen(None);
            if let Some(handlers) = &self.handlers {
                if let Err(e) = source.remove_event_listener_with_callback(
                    CLOSE_EVENT,
                    handlers.close.as_ref().unchecked_ref(),
                ) {
                    log_error(&format!("removing close listener failed: {}", describe(&e)));
                }
            }
        }
        if let Some(handlers) = self.handlers.take() {
            self.retired.push(handlers);
        }
    }
}

thread_local! {
    static TRAINER: RefCell<Option<Trainer>> = const { RefCell::new(None) };
}

/// Build a trainer from the train button's data attributes
fn build_trainer(document: &Document, runs: RunCounter) -> Result<Trainer, JsValue> {
    let panel = config::current();
    let ids = panel.console.clone();

    let button = element::<HtmlElement>(document, &ids.train_button)?;
    let stream_url = button
        .get_attribute(&ids.stream_url_attribute)
        .ok_or("train button has no stream URL")?;
    let complete_url = button
        .get_attribute(&ids.complete_url_attribute)
        .ok_or("train button has no completion URL")?;

    Ok(Trainer {
        runs,
        session: TrainingSession::new(panel.console_config(&stream_url, &complete_url)),
        ids,
        source: None,
        handlers: None,
        retired: Vec::new(),
    })
}

/// Start a new run, closing whatever stream the previous one left open
pub fn start() -> Result<(), JsValue> {
    let document = crate::dom::document()?;

    let mut runs = TRAINER
        .with(|t| {
            t.borrow_mut().as_mut().map(|trainer| {
                trainer.close_stream();
                trainer.runs
            })
        })
        .unwrap_or_default();
    let run = runs.begin();
    let trainer = build_trainer(&document, runs)?;
    TRAINER.with(|t| *t.borrow_mut() = Some(trainer));

    dispatch(&document, run, |session| session.start())
}

/// Write the completion lines and notify the server, once per run
pub fn finish() -> Result<(), JsValue> {
    let document = crate::dom::document()?;

    let existing = TRAINER.with(|t| {
        t.borrow_mut()
            .as_mut()
            .map(|trainer| trainer.runs.current_or_begin())
    });
    let run = match existing {
        Some(run) => run,
        None => {
            let mut runs = RunCounter::new();
            let run = runs.begin();
            let trainer = build_trainer(&document, runs)?;
            TRAINER.with(|t| *t.borrow_mut() = Some(trainer));
            run
        }
    };

    dispatch(&document, run, |session| session.finish())
}

/// Run a session handler for `run` and apply its effects
fn dispatch<F>(document: &Document, run: u64, f: F) -> Result<(), JsValue>
where
    F: FnOnce(&mut TrainingSession) -> Vec<ConsoleEffect>,
{
    let effects = TRAINER.with(|t| match t.borrow_mut().as_mut() {
        Some(trainer) if trainer.runs.accepts(run) => f(&mut trainer.session),
        _ => Vec::new(),
    });
    apply(document, run, effects)
}

/// Dispatch from an event handler, where errors can only be logged
fn dispatch_event<F>(run: u64, f: F)
where
    F: FnOnce(&mut TrainingSession) -> Vec<ConsoleEffect>,
{
    let result = crate::dom::document().and_then(|document| dispatch(&document, run, f));
    if let Err(e) = result {
        log_error(&format!("training console: {}", describe(&e)));
    }
}

fn apply(document: &Document, run: u64, effects: Vec<ConsoleEffect>) -> Result<(), JsValue> {
    if effects.is_empty() {
        return Ok(());
    }

    let (ids, labels) = TRAINER
        .with(|t| {
            t.borrow()
                .as_ref()
                .map(|trainer| (trainer.ids.clone(), trainer.session.config().labels.clone()))
        })
        .ok_or("training console not initialized")?;
    let terminal = element::<HtmlElement>(document, &ids.terminal_output)?;

    for effect in effects {
        match effect {
            ConsoleEffect::TrainButton(state) => {
                let button = element::<HtmlButtonElement>(document, &ids.train_button)?;
                render_button(&button, &button_appearance(state, &labels))?;
            }
            ConsoleEffect::ShowTerminal => {
                let container = element::<HtmlElement>(document, &ids.terminal_container)?;
                set_display(&container, "block")?;
                set_display(&terminal, "block")?;
            }
            ConsoleEffect::ResetLog(line) => {
                terminal.set_inner_html("");
                let div = line_element(document, &line)?;
                terminal.append_child(&div)?;
            }
            ConsoleEffect::AppendLine(line) => {
                let div = line_element(document, &line)?;
                terminal.append_child(&div)?;
            }
            ConsoleEffect::ScrollToBottom => terminal.set_scroll_top(terminal.scroll_height()),
            ConsoleEffect::OpenStream(url) => open_stream(run, &url)?,
            ConsoleEffect::CloseStream => TRAINER.with(|t| {
                if let Some(trainer) = t.borrow_mut().as_mut() {
                    trainer.close_stream();
                }
            }),
            ConsoleEffect::PostCompletion(url) => post_completion(run, url),
            ConsoleEffect::RevealFinish => {
                let finish = element::<HtmlElement>(document, &ids.finish_button)?;
                set_display(&finish, "inline-block")?;
            }
            ConsoleEffect::DevLog(LogLevel::Info, msg) => log(&msg),
            ConsoleEffect::DevLog(LogLevel::Error, msg) => log_error(&msg),
        }
    }

    Ok(())
}

fn render_button(button: &HtmlButtonElement, look: &ButtonAppearance) -> Result<(), JsValue> {
    if let Some(disabled) = look.disabled {
        button.set_disabled(disabled);
    }
    button.set_inner_text(&look.label);
    if let Some(opacity) = look.opacity {
        button.style().set_property("opacity", opacity)?;
    }
    Ok(())
}

fn line_element(document: &Document, line: &TerminalLine) -> Result<HtmlElement, JsValue> {
    let div: HtmlElement = document.create_element("div")?.dyn_into()?;
    div.set_class_name(line.tone.class_name());
    div.set_text_content(Some(&line.text));

    let style = div.style();
    if let Some(color) = line.tone.color() {
        style.set_property("color", color)?;
    }
    if line.tone.bold() {
        style.set_property("font-weight", "bold")?;
    }
    Ok(div)
}

fn open_stream(run: u64, url: &str) -> Result<(), JsValue> {
    let source = EventSource::new(url)?;

    let message_closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        let data = event.data().as_string().unwrap_or_default();
        dispatch_event(run, |session| session.on_message(&data));
    }) as Box<dyn FnMut(MessageEvent)>);

    let source_clone = source.clone();
    let error_closure = Closure::wrap(Box::new(move |_event: Event| {
        let ready_state = ReadyState::from_code(source_clone.ready_state());
        dispatch_event(run, |session| session.on_error(ready_state));
    }) as Box<dyn FnMut(Event)>);

    let open_closure = Closure::wrap(Box::new(move |_event: Event| {
        dispatch_event(run, |session| session.on_open());
    }) as Box<dyn FnMut(Event)>);

    // `event: close` frames bypass onmessage; treat them as the sentinel
    let close_closure = Closure::wrap(Box::new(move |_event: Event| {
        dispatch_event(run, |session| {
            let sentinel = session.config().rules.close_sentinel.clone();
            session.on_message(&sentinel)
        });
    }) as Box<dyn FnMut(Event)>);

    TRAINER.with(|t| match t.borrow_mut().as_mut() {
        Some(trainer) => {
            trainer.close_stream();
            source.set_onmessage(Some(message_closure.as_ref().unchecked_ref()));
            source.set_onerror(Some(error_closure.as_ref().unchecked_ref()));
            source.set_onopen(Some(open_closure.as_ref().unchecked_ref()));
            source.add_event_listener_with_callback(
                CLOSE_EVENT,
                close_closure.as_ref().unchecked_ref(),
            )?;
            trainer.source = Some(source);
            trainer.handlers = Some(StreamHandlers {
                _message: message_closure,
                _error: error_closure,
                _open: open_closure,
                close: close_closure,
            });
            Ok(())
        }
        None => {
            source.close();
            Err(JsValue::from_str("training console not initialized"))
        }
    })
}

fn post_completion(run: u64, url: String) {
    spawn_local(async move {
        match send_completion(&url).await {
            Ok(status) => dispatch_event(run, |session| session.on_completion_response(status)),
            Err(e) => {
                let reason = describe(&e);
                dispatch_event(run, |session| session.on_completion_failed(&reason));
            }
        }
    });
}

async fn send_completion(url: &str) -> Result<u16, JsValue> {
    let window = web_sys::window().ok_or("No window")?;

    let init = RequestInit::new();
    init.set_method("POST");

    let response = JsFuture::from(window.fetch_with_str_and_init(url, &init)).await?;
    let response: Response = response.dyn_into()?;
    Ok(response.status())
}
