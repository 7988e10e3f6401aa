//! Query pipeline and session state
//!
//! A lookup runs fetch → aggregate and yields either a `ViewModel` or a
//! tagged `QueryError`. `Session` owns the state that survives between
//! lookups: the unit system, the last displayed view model, and the
//! generation counter that decides which of several overlapping lookups
//! gets displayed (the most recently started one).

use std::sync::Arc;

use chrono::{Local, Utc};
use thiserror::Error;

use crate::data::{
    CurrentConditionsView, FetchError, GeolocationError, Geolocator, Location, LocationSpec,
    Units, ViewModel, WeatherSource,
};
use crate::forecast::{self, AggregateError, ForecastLimits};

const NAME_LOOKUP_FAILED: &str =
    "Failed to fetch weather data. Please check the city name and try again.";
const POSITION_LOOKUP_FAILED: &str = "Failed to fetch weather data for your location";
const GEOLOCATION_UNSUPPORTED: &str = "Geolocation is not supported on this system";
const GEOLOCATION_FAILED: &str =
    "Unable to retrieve your location. Please enable location services.";

/// What a lookup is for
#[derive(Debug, Clone, PartialEq)]
pub enum QueryTarget {
    /// A known place name or position
    Location(LocationSpec),
    /// Wherever the device currently is
    DevicePosition,
}

impl From<LocationSpec> for QueryTarget {
    fn from(spec: LocationSpec) -> Self {
        QueryTarget::Location(spec)
    }
}

/// A lookup request stamped by the session
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTicket {
    /// Monotonically increasing per session; only the latest is displayed
    pub generation: u64,
    pub target: QueryTarget,
    pub units: Units,
}

/// Why a lookup could not produce a view model
#[derive(Debug, Error)]
pub enum QueryError {
    /// Current conditions failed for a named location
    #[error("location not found: {location}")]
    LocationNotFound {
        location: LocationSpec,
        #[source]
        source: FetchError,
    },

    /// Current conditions failed for a coordinate lookup
    #[error("current conditions unavailable for {location}")]
    CurrentUnavailable {
        location: LocationSpec,
        #[source]
        source: FetchError,
    },

    /// Current conditions succeeded but the forecast did not
    #[error("forecast unavailable for {location}")]
    ForecastUnavailable {
        location: LocationSpec,
        #[source]
        source: FetchError,
    },

    /// The forecast could not be aggregated
    #[error("could not aggregate forecast for {location}")]
    Aggregate {
        location: LocationSpec,
        #[source]
        source: AggregateError,
    },

    /// The device position could not be determined
    #[error("could not determine position")]
    Geolocation(#[from] GeolocationError),
}

impl QueryError {
    /// Message shown to the user
    pub fn user_message(&self) -> &'static str {
        let location = match self {
            QueryError::Geolocation(GeolocationError::Unsupported) => {
                return GEOLOCATION_UNSUPPORTED
            }
            QueryError::Geolocation(_) => return GEOLOCATION_FAILED,
            QueryError::LocationNotFound { location, .. }
            | QueryError::CurrentUnavailable { location, .. }
            | QueryError::ForecastUnavailable { location, .. }
            | QueryError::Aggregate { location, .. } => location,
        };

        match location {
            LocationSpec::ByName(_) => NAME_LOOKUP_FAILED,
            LocationSpec::ByCoordinates(_) => POSITION_LOOKUP_FAILED,
        }
    }
}

/// Receives the result of a lookup
pub trait Presenter {
    /// Display a freshly assembled view model
    fn present(&mut self, view: &ViewModel);

    /// Report a lookup that produced no view model
    fn on_error(&mut self, message: &str);
}

/// What `Session::complete` did with a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The view model was stored and presented
    Displayed,
    /// The error message was presented
    Failed(String),
    /// A newer lookup was started; the result was dropped
    Superseded,
}

/// Runs lookups against a weather source
pub struct WeatherService {
    source: Arc<dyn WeatherSource>,
    geolocator: Arc<dyn Geolocator>,
    limits: ForecastLimits,
}

impl WeatherService {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        geolocator: Arc<dyn Geolocator>,
        limits: ForecastLimits,
    ) -> Self {
        Self {
            source,
            geolocator,
            limits,
        }
    }

    /// Runs fetch → aggregate for a ticket
    ///
    /// Current conditions are fetched first; the forecast is only requested
    /// once they succeed, and aggregation only runs on a complete fetch.
    pub async fn run(&self, ticket: &QueryTicket) -> Result<ViewModel, QueryError> {
        let location = match &ticket.target {
            QueryTarget::Location(spec) => spec.clone(),
            QueryTarget::DevicePosition => {
                LocationSpec::ByCoordinates(self.geolocator.locate().await?)
            }
        };
        tracing::info!(generation = ticket.generation, %location, units = ticket.units.as_query(), "running lookup");

        let current = match self.source.fetch_current(&location, ticket.units).await {
            Ok(current) => current,
            Err(source) => {
                return Err(match location {
                    LocationSpec::ByName(_) => QueryError::LocationNotFound { location, source },
                    LocationSpec::ByCoordinates(_) => {
                        QueryError::CurrentUnavailable { location, source }
                    }
                })
            }
        };

        let samples = match self.source.fetch_forecast(&location, ticket.units).await {
            Ok(samples) => samples,
            Err(source) => return Err(QueryError::ForecastUnavailable { location, source }),
        };

        let forecast = match forecast::aggregate(&samples, self.limits, &Local) {
            Ok(forecast) => forecast,
            Err(source) => return Err(QueryError::Aggregate { location, source }),
        };

        Ok(ViewModel {
            location: Location::from_raw(&current),
            current: CurrentConditionsView::from_raw(&current),
            forecast,
            units: ticket.units,
            fetched_at: Utc::now(),
        })
    }

    /// Starts a lookup on the session, runs it and delivers the result
    pub async fn execute(
        &self,
        session: &mut Session,
        target: QueryTarget,
        presenter: &mut impl Presenter,
    ) -> QueryOutcome {
        let ticket = session.begin(target);
        let result = self.run(&ticket).await;
        session.complete(&ticket, result, presenter)
    }
}

/// Per-view state shared by successive lookups
#[derive(Debug, Clone)]
pub struct Session {
    /// Units of the last successful lookup
    units: Units,
    /// Units stamped on the next ticket
    requested_units: Units,
    view: Option<ViewModel>,
    latest_generation: u64,
    /// Target of the latest ticket while it has not completed
    in_flight: Option<QueryTarget>,
}

impl Session {
    pub fn new(units: Units) -> Self {
        Self {
            units,
            requested_units: units,
            view: None,
            latest_generation: 0,
            in_flight: None,
        }
    }

    /// The unit system currently displayed
    pub fn units(&self) -> Units {
        self.units
    }

    /// The unit system the next lookup runs in
    ///
    /// Differs from `units` while a unit change is still loading.
    pub fn requested_units(&self) -> Units {
        self.requested_units
    }

    /// The last successfully displayed view model
    pub fn view(&self) -> Option<&ViewModel> {
        self.view.as_ref()
    }

    /// Stamps a new lookup, superseding any in flight
    pub fn begin(&mut self, target: QueryTarget) -> QueryTicket {
        self.latest_generation += 1;
        self.in_flight = Some(target.clone());
        QueryTicket {
            generation: self.latest_generation,
            target,
            units: self.requested_units,
        }
    }

    /// Whether `ticket` is the most recently started lookup
    pub fn is_current(&self, ticket: &QueryTicket) -> bool {
        ticket.generation == self.latest_generation
    }

    /// Applies a lookup result and hands it to the presenter
    ///
    /// Results from superseded lookups are dropped. The ticket's units become
    /// the session's units only on success; a failure keeps the previous view
    /// model and units so the location and the unit change can be retried.
    pub fn complete(
        &mut self,
        ticket: &QueryTicket,
        result: Result<ViewModel, QueryError>,
        presenter: &mut impl Presenter,
    ) -> QueryOutcome {
        if !self.is_current(ticket) {
            tracing::debug!(
                generation = ticket.generation,
                latest = self.latest_generation,
                "dropping superseded lookup result"
            );
            return QueryOutcome::Superseded;
        }
        self.in_flight = None;

        match result {
            Ok(view) => {
                presenter.present(&view);
                self.units = ticket.units;
                self.view = Some(view);
                QueryOutcome::Displayed
            }
            Err(error) => {
                tracing::warn!(error = %error, source = ?std::error::Error::source(&error), "lookup failed");
                self.requested_units = self.units;
                let message = error.user_message();
                presenter.on_error(message);
                QueryOutcome::Failed(message.to_string())
            }
        }
    }

    /// Requests a different unit system
    ///
    /// Returns a ticket re-running the pending lookup, or the displayed
    /// location, in the new units. The switch only takes effect once that
    /// lookup succeeds. With nothing loaded or loading the unit switches
    /// immediately and `None` is returned, as it is for an unchanged unit.
    pub fn change_units(&mut self, units: Units) -> Option<QueryTicket> {
        if units == self.requested_units {
            return None;
        }
        self.requested_units = units;
        tracing::info!(units = units.as_query(), "unit change requested");

        let ticket = self.reload();
        if ticket.is_none() {
            self.units = units;
        }
        ticket
    }

    /// Re-runs the pending lookup, or the displayed location by name
    pub fn reload(&mut self) -> Option<QueryTicket> {
        let target = match (&self.in_flight, &self.view) {
            (Some(target), _) => target.clone(),
            (None, Some(view)) => {
                QueryTarget::Location(LocationSpec::ByName(view.location.name.clone()))
            }
            (None, None) => return None,
        };
        Some(self.begin(target))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::data::{Coordinates, RawCurrentConditions, RawForecastSample};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted weather source recording every request
    #[derive(Default)]
    pub struct FakeSource {
        pub current: Option<RawCurrentConditions>,
        pub forecast: Option<Vec<RawForecastSample>>,
        pub calls: Mutex<Vec<(&'static str, LocationSpec, Units)>>,
    }

    impl FakeSource {
        pub fn working() -> Self {
            Self {
                current: Some(crate::data::test_support::london_current()),
                forecast: Some(crate::data::test_support::three_hourly(1_721_001_600, 40)),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<(&'static str, LocationSpec, Units)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WeatherSource for FakeSource {
        async fn fetch_current(
            &self,
            location: &LocationSpec,
            units: Units,
        ) -> Result<RawCurrentConditions, FetchError> {
            self.calls.lock().unwrap().push(("current", location.clone(), units));
            let mut current = self
                .current
                .clone()
                .ok_or_else(|| FetchError::NotFound(location.to_string()))?;
            if let LocationSpec::ByName(name) = location {
                current.name = name.clone();
            }
            Ok(current)
        }

        async fn fetch_forecast(
            &self,
            location: &LocationSpec,
            units: Units,
        ) -> Result<Vec<RawForecastSample>, FetchError> {
            self.calls.lock().unwrap().push(("forecast", location.clone(), units));
            self.forecast
                .clone()
                .ok_or_else(|| FetchError::MissingField("list".to_string()))
        }
    }

    /// Geolocator returning a fixed position
    pub struct FixedGeolocator(pub Coordinates);

    #[async_trait]
    impl Geolocator for FixedGeolocator {
        async fn locate(&self) -> Result<Coordinates, GeolocationError> {
            Ok(self.0)
        }
    }

    /// Presenter recording what it was shown
    #[derive(Debug, Default)]
    pub struct RecordingPresenter {
        pub presented: Vec<String>,
        pub errors: Vec<String>,
    }

    impl Presenter for RecordingPresenter {
        fn present(&mut self, view: &ViewModel) {
            self.presented.push(view.location.name.clone());
        }

        fn on_error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }
    }
}
