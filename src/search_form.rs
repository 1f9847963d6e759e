//! The departures search form: binds the destinations and flights stores to
//! the interaction events of the search field, the suggestion panel and the
//! order selector.
//!
//! The form is a small state machine: inactive, or active with the panel
//! visible as soon as something is typed. It owns the input being edited;
//! the data it displays lives in the two stores handed to [`SearchForm::new`].

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, warn};

use departure_search::flights::{Flight, SearchQuery, SortOrder};
use departure_search::suggester;

use crate::store::{AsyncStore, Status};
use crate::subscription::{Registry, Subscription};

/// Minimum typed length before a search may be submitted.
pub const MIN_DESTINATION_LEN: usize = 3;

/// A click somewhere in the document, as observed by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    /// whether the click landed on the form or one of its children
    pub inside_form: bool,
}

/// What the suggestion panel should currently show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionPanel {
    /// panel closed: the form is inactive or nothing is typed yet
    Hidden,
    /// the destination list is still being fetched
    Loading,
    /// ranked suggestions for the typed text; `typed` carries the literal
    /// query as an extra option when it is not already among `ranked`
    Ready {
        typed: Option<String>,
        ranked: Vec<String>,
    },
}

pub struct SearchForm {
    pub destinations: AsyncStore<Vec<String>>,
    pub flights: AsyncStore<Vec<Flight>, SearchQuery>,
    state: Rc<RefCell<FormState>>,
    clicks: Registry<ClickEvent>,
}

#[derive(Default)]
struct FormState {
    query: SearchQuery,
    active: bool,
    click_sub: Option<Subscription<ClickEvent>>,
}

impl FormState {
    /// Leave the active state and let go of the click listener.
    fn close(&mut self) {
        self.active = false;
        self.click_sub = None;
    }
}

impl SearchForm {
    /// `clicks` is the document level click feed; the form only listens to
    /// it while active.
    pub fn new(
        destinations: AsyncStore<Vec<String>>,
        flights: AsyncStore<Vec<Flight>, SearchQuery>,
        clicks: Registry<ClickEvent>,
    ) -> Self {
        Self {
            destinations,
            flights,
            state: Rc::new(RefCell::new(FormState::default())),
            clicks,
        }
    }

    /// The search field gained focus: open the form and fetch the
    /// destination list the first time round. Data already present is never
    /// refetched and a load already in flight is left alone.
    pub async fn focus(&self) {
        self.activate();
        if self.destinations.status() != Status::Loading && !self.destinations.has_data() {
            if let Err(error) = self.destinations.load().await {
                warn!("failed to load destinations: {}", error);
            }
        }
    }

    fn activate(&self) {
        let mut state = self.state.borrow_mut();
        state.active = true;
        if state.click_sub.is_none() {
            let weak = Rc::downgrade(&self.state);
            state.click_sub = Some(self.clicks.subscribe(move |click: &ClickEvent| {
                if !click.inside_form {
                    close_from_click(&weak);
                }
            }));
        }
    }

    /// A keystroke in the destination field.
    pub fn input(&self, value: &str) {
        self.state.borrow_mut().query.destination = value.to_owned();
    }

    /// A suggestion was picked: it replaces the typed destination but does
    /// not submit by itself, submission stays an explicit action.
    pub fn select(&self, suggestion: &str) {
        self.state.borrow_mut().query.destination = suggestion.to_owned();
    }

    /// Submit the search: close the panel and fetch flights for the current
    /// input. Destinations shorter than [`MIN_DESTINATION_LEN`] never reach
    /// the fetch layer.
    pub async fn submit(&self) {
        let query = {
            let mut state = self.state.borrow_mut();
            if state.query.destination.chars().count() < MIN_DESTINATION_LEN {
                debug!(
                    "refusing to search for {:?}: destination too short",
                    state.query.destination
                );
                return;
            }
            state.close();
            state.query.clone()
        };
        if let Err(error) = self.flights.load_with(query).await {
            warn!("flight search failed: {}", error);
        }
    }

    /// The order selector changed: store the new order and re-run the search
    /// immediately, without waiting for a submit.
    pub async fn set_order(&self, order: SortOrder) {
        let query = {
            let mut state = self.state.borrow_mut();
            state.query.order = order;
            state.query.clone()
        };
        if let Err(error) = self.flights.load_with(query).await {
            warn!("flight search failed: {}", error);
        }
    }

    /// Document level clicks are fed in through this handle; a click outside
    /// the form boundary closes the panel while the form is active, a click
    /// inside does not.
    pub fn clicks(&self) -> Registry<ClickEvent> {
        self.clicks.clone()
    }

    pub fn is_active(&self) -> bool {
        self.state.borrow().active
    }

    /// Snapshot of the current search input.
    pub fn query(&self) -> SearchQuery {
        self.state.borrow().query.clone()
    }

    /// Derived view state of the suggestion panel, recomputed on demand from
    /// the typed text and whatever the destinations store holds.
    pub fn suggestions(&self) -> SuggestionPanel {
        let state = self.state.borrow();
        if !state.active || state.query.destination.is_empty() {
            return SuggestionPanel::Hidden;
        }
        if self.destinations.status() == Status::Loading {
            return SuggestionPanel::Loading;
        }
        let typed = &state.query.destination;
        let ranked: Vec<String> = match self.destinations.data() {
            Some(destinations) => suggester::rank(destinations.iter().map(String::as_str), typed)
                .into_iter()
                .map(str::to_owned)
                .collect(),
            None => Vec::new(),
        };
        let typed = if ranked.iter().any(|suggestion| suggestion == typed) {
            None
        } else {
            Some(typed.clone())
        };
        SuggestionPanel::Ready { typed, ranked }
    }
}

fn close_from_click(state: &Weak<RefCell<FormState>>) {
    if let Some(state) = state.upgrade() {
        state.borrow_mut().close();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use enclose::enclose;
    use futures::channel::oneshot;
    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;
    use std::cell::Cell;
    use std::collections::VecDeque;

    use crate::store::LoadError;

    fn destinations_store(destinations: Vec<&str>) -> (AsyncStore<Vec<String>>, Rc<Cell<u32>>) {
        let destinations: Vec<String> = destinations.into_iter().map(str::to_owned).collect();
        let calls = Rc::new(Cell::new(0));
        let store = AsyncStore::new(enclose!((calls) move |()| {
            calls.set(calls.get() + 1);
            let destinations = destinations.clone();
            async move { Ok(destinations) }
        }));
        (store, calls)
    }

    fn recording_flights_store() -> (
        AsyncStore<Vec<Flight>, SearchQuery>,
        Rc<RefCell<Vec<SearchQuery>>>,
    ) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let store: AsyncStore<Vec<Flight>, SearchQuery> =
            AsyncStore::new(enclose!((calls) move |query: SearchQuery| {
                calls.borrow_mut().push(query);
                async { Ok(Vec::new()) }
            }));
        (store, calls)
    }

    fn form_with(destinations: Vec<&str>) -> (SearchForm, Rc<Cell<u32>>, Rc<RefCell<Vec<SearchQuery>>>) {
        let (destinations, destination_loads) = destinations_store(destinations);
        let (flights, searches) = recording_flights_store();
        let form = SearchForm::new(destinations, flights, Registry::new());
        (form, destination_loads, searches)
    }

    #[test]
    fn focus_loads_destinations_exactly_once() {
        let (form, loads, _) = form_with(vec!["Paris"]);
        block_on(form.focus());
        assert!(form.is_active());
        assert_eq!(loads.get(), 1);

        // data is present now, a second focus must not refetch
        block_on(form.focus());
        assert_eq!(loads.get(), 1);
    }

    #[test]
    fn focus_does_not_refetch_while_a_load_is_in_flight() {
        let (tx, rx) = oneshot::channel::<Result<Vec<String>, LoadError>>();
        let calls = Rc::new(Cell::new(0));
        let rx = RefCell::new(VecDeque::from(vec![rx]));
        let destinations = AsyncStore::new(enclose!((calls) move |()| {
            calls.set(calls.get() + 1);
            let rx = rx.borrow_mut().pop_front().expect("a single load");
            async move { rx.await.unwrap() }
        }));
        let (flights, _) = recording_flights_store();
        let form = Rc::new(SearchForm::new(destinations, flights, Registry::new()));

        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        spawner
            .spawn_local(enclose!((form) async move { form.focus().await }))
            .unwrap();
        pool.run_until_stalled();
        assert_eq!(calls.get(), 1);

        spawner
            .spawn_local(enclose!((form) async move { form.focus().await }))
            .unwrap();
        pool.run_until_stalled();
        assert_eq!(calls.get(), 1);

        tx.send(Ok(vec!["Paris".to_owned()])).unwrap();
        pool.run_until_stalled();
        assert_eq!(calls.get(), 1);
        assert!(form.destinations.has_data());
    }

    #[test]
    fn typing_shows_the_query_and_matching_suggestions() {
        let (form, _, _) = form_with(vec!["Paris"]);
        block_on(form.focus());

        form.input("P");
        assert_eq!(
            form.suggestions(),
            SuggestionPanel::Ready {
                typed: Some("P".to_owned()),
                ranked: vec!["Paris".to_owned()],
            }
        );

        form.input("Paris");
        assert_eq!(
            form.suggestions(),
            SuggestionPanel::Ready {
                typed: None,
                ranked: vec!["Paris".to_owned()],
            }
        );
    }

    #[test]
    fn panel_is_hidden_until_focused_and_typed() {
        let (form, _, _) = form_with(vec!["Paris"]);
        assert_eq!(form.suggestions(), SuggestionPanel::Hidden);

        block_on(form.focus());
        // active but nothing typed yet
        assert_eq!(form.suggestions(), SuggestionPanel::Hidden);

        form.input("Par");
        assert_ne!(form.suggestions(), SuggestionPanel::Hidden);
    }

    #[test]
    fn panel_shows_a_placeholder_while_destinations_load() {
        let (tx, rx) = oneshot::channel::<Result<Vec<String>, LoadError>>();
        let rx = RefCell::new(Some(rx));
        let destinations = AsyncStore::new(move |()| {
            let rx = rx.borrow_mut().take().expect("a single load");
            async move { rx.await.unwrap() }
        });
        let (flights, _) = recording_flights_store();
        let form = Rc::new(SearchForm::new(destinations, flights, Registry::new()));

        let mut pool = LocalPool::new();
        pool.spawner()
            .spawn_local(enclose!((form) async move { form.focus().await }))
            .unwrap();
        pool.run_until_stalled();

        form.input("Par");
        assert_eq!(form.suggestions(), SuggestionPanel::Loading);

        tx.send(Ok(vec!["Paris".to_owned()])).unwrap();
        pool.run_until_stalled();
        assert_eq!(
            form.suggestions(),
            SuggestionPanel::Ready {
                typed: Some("Par".to_owned()),
                ranked: vec!["Paris".to_owned()],
            }
        );
    }

    #[test]
    fn a_failed_destination_load_still_offers_the_typed_text() {
        let destinations: AsyncStore<Vec<String>> =
            AsyncStore::new(|()| async { Err(LoadError::Fetch("no network".to_owned())) });
        let (flights, _) = recording_flights_store();
        let form = SearchForm::new(destinations, flights, Registry::new());

        block_on(form.focus());
        assert_eq!(
            form.destinations.error(),
            Some(LoadError::Fetch("no network".to_owned()))
        );

        form.input("Par");
        assert_eq!(
            form.suggestions(),
            SuggestionPanel::Ready {
                typed: Some("Par".to_owned()),
                ranked: Vec::new(),
            }
        );
    }

    #[test]
    fn selecting_a_suggestion_does_not_submit() {
        let (form, _, searches) = form_with(vec!["Paris"]);
        block_on(form.focus());
        form.input("Par");
        form.select("Paris");
        assert_eq!(form.query().destination, "Paris");
        assert!(searches.borrow().is_empty());
        assert!(form.is_active());
    }

    #[test]
    fn select_then_submit_searches_once_with_that_destination() {
        let (form, _, searches) = form_with(vec!["Paris"]);
        block_on(form.focus());
        form.input("Par");
        form.select("Paris");
        block_on(form.submit());

        assert_eq!(
            *searches.borrow(),
            vec![SearchQuery {
                destination: "Paris".to_owned(),
                order: SortOrder::Asc,
            }]
        );
        assert!(!form.is_active());
        assert_eq!(form.suggestions(), SuggestionPanel::Hidden);
    }

    #[test]
    fn short_destinations_never_reach_the_fetch_layer() {
        let (form, _, searches) = form_with(vec!["Paris"]);
        block_on(form.focus());
        form.input("Pa");
        block_on(form.submit());
        assert!(searches.borrow().is_empty());
        // refusing locally leaves no error behind
        assert_eq!(form.flights.error(), None);
    }

    #[test]
    fn changing_the_order_searches_immediately() {
        let (form, _, searches) = form_with(vec!["Paris"]);
        block_on(form.focus());
        form.input("Paris");
        block_on(form.set_order(SortOrder::Desc));

        assert_eq!(
            *searches.borrow(),
            vec![SearchQuery {
                destination: "Paris".to_owned(),
                order: SortOrder::Desc,
            }]
        );
        assert_eq!(form.query().order, SortOrder::Desc);
    }

    #[test]
    fn clicks_outside_close_the_panel_clicks_inside_do_not() {
        let (form, _, _) = form_with(vec!["Paris"]);
        block_on(form.focus());
        form.input("Par");

        form.clicks().emit(&ClickEvent { inside_form: true });
        assert!(form.is_active());
        assert_ne!(form.suggestions(), SuggestionPanel::Hidden);

        form.clicks().emit(&ClickEvent { inside_form: false });
        assert!(!form.is_active());
        assert_eq!(form.suggestions(), SuggestionPanel::Hidden);
        // the click listener went with the panel
        assert!(form.clicks().is_empty());
    }

    #[test]
    fn the_click_listener_is_scoped_to_the_active_form() {
        let (form, _, _) = form_with(vec!["Paris"]);
        assert!(form.clicks().is_empty());

        block_on(form.focus());
        assert!(!form.clicks().is_empty());

        form.input("Paris");
        block_on(form.submit());
        assert!(form.clicks().is_empty());

        // reactivation subscribes again
        block_on(form.focus());
        assert!(!form.clicks().is_empty());
    }
}
