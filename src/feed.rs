use crate::error::RugenError;
use crate::types::{GenerationParameters, ResultRow};

/// How a page's rows are merged into the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    Replace,
    Append,
}

/// A fetch the controller wants performed. The `generation` comes back with
/// the response so stale results can be recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub params: GenerationParameters,
    pub page: u32,
    pub merge: Merge,
}

/// What happened to a response handed to [`Feed::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Replaced(usize),
    Appended(usize),
    /// The server had no more rows for these parameters.
    Exhausted,
    Failed(String),
    Stale,
}

/// Accumulated rows for the current generation parameters plus the page
/// cursor. Parameter changes restart from page 1; same-parameter page
/// requests extend the list in server order.
#[derive(Debug, Default)]
pub struct Feed {
    rows: Vec<ResultRow>,
    params: GenerationParameters,
    /// Parameters the current rows were fetched with.
    loaded_params: Option<GenerationParameters>,
    loaded_page: u32,
    generation: u64,
    in_flight: Option<FetchRequest>,
    exhausted: bool,
    error: Option<String>,
}

impl Feed {
    pub fn new(params: GenerationParameters) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn params(&self) -> GenerationParameters {
        self.params
    }

    pub fn page(&self) -> u32 {
        self.loaded_page
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Adopt new parameters. Returns the page-1 request when they differ
    /// from what is loaded (or nothing is loaded yet); otherwise `None`.
    pub fn set_params(&mut self, params: GenerationParameters) -> Option<FetchRequest> {
        self.params = params;
        let pending_same = self
            .in_flight
            .is_some_and(|r| r.merge == Merge::Replace && r.params == params);
        if pending_same {
            return None;
        }
        if self.loaded_params == Some(params) {
            // Back to what is on screen: a reset still in flight for other
            // parameters must not land.
            if self.in_flight.is_some_and(|r| r.params != params) {
                self.in_flight = None;
                self.generation += 1;
            }
            return None;
        }
        Some(self.issue(1, Merge::Replace))
    }

    /// Reload page 1 for the current parameters.
    pub fn refresh(&mut self) -> FetchRequest {
        self.issue(1, Merge::Replace)
    }

    /// Request the page after the last one loaded. Ignored until the first
    /// page has landed, while another request is pending, or once the server
    /// has run out of rows.
    pub fn next_page(&mut self) -> Option<FetchRequest> {
        if self.in_flight.is_some() || self.exhausted {
            return None;
        }
        if self.loaded_params != Some(self.params) {
            return None;
        }
        Some(self.issue(self.loaded_page + 1, Merge::Append))
    }

    fn issue(&mut self, page: u32, merge: Merge) -> FetchRequest {
        self.generation += 1;
        self.error = None;
        let request = FetchRequest {
            generation: self.generation,
            params: self.params,
            page,
            merge,
        };
        tracing::debug!(
            generation = request.generation,
            page,
            ?merge,
            region = request.params.region.code(),
            "issuing fetch"
        );
        self.in_flight = Some(request);
        request
    }

    /// Merge a response. Anything not tagged with the latest generation is
    /// dropped without touching state.
    pub fn apply(
        &mut self,
        generation: u64,
        result: Result<Vec<ResultRow>, RugenError>,
    ) -> Applied {
        let Some(request) = self.in_flight.filter(|r| r.generation == generation) else {
            tracing::debug!(generation, latest = self.generation, "dropping stale response");
            return Applied::Stale;
        };
        self.in_flight = None;

        let rows = match result {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, page = request.page, "fetch failed");
                let message = e.user_message();
                self.error = Some(message.clone());
                return Applied::Failed(message);
            }
        };

        match request.merge {
            Merge::Replace => {
                let count = rows.len();
                self.rows = rows;
                self.loaded_params = Some(request.params);
                self.loaded_page = request.page;
                self.exhausted = count == 0;
                Applied::Replaced(count)
            }
            Merge::Append if rows.is_empty() => {
                self.exhausted = true;
                Applied::Exhausted
            }
            Merge::Append => {
                let count = rows.len();
                self.rows.extend(rows);
                self.loaded_page = request.page;
                Applied::Appended(count)
            }
        }
    }
}
