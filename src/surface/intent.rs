use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Pickup,
    Dropoff,
}

/// A user intent raised by the console.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    CreateRider { name: String, phone: String },
    UseRider { id: String, credential: String },
    CreateDriver {
        name: String,
        phone: String,
        make: String,
        model: String,
        plate: String,
        color: Option<String>,
    },
    UseDriver { id: String, credential: String },
    SetEndpoint { endpoint: Endpoint, lat: String, lng: String },
    SetDistance(String),
    SetDuration(String),
    Search(String),
    Results,
    Fare,
    Pick { index: usize, endpoint: Endpoint },
    RequestRide,
    Assign { ride_id: String, driver_id: Option<String> },
    Advance { ride_id: String },
    Cancel { ride_id: String },
    Nearby { lat: String, lng: String, radius_km: String },
    AllDrivers,
    Locate { lat: String, lng: String },
    Route { ride_id: String },
    Refresh,
    ListRides,
    ListDrivers,
    Metrics,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  rider NAME PHONE                         register a rider
  use-rider ID KEY                         act as an existing rider
  driver NAME PHONE MAKE MODEL PLATE [COLOR]
  use-driver ID KEY                        act as an existing driver
  pickup LAT LNG | dropoff LAT LNG         set ride endpoints
  distance KM | duration MIN               trip inputs (re-estimates fare)
  fare                                     show the current estimate
  search TEXT | results                    look up a place, list the matches
  pick N pickup|dropoff                    use search result N
  request                                  request the drafted ride
  assign RIDE [DRIVER]                     assign a driver (default: active driver)
  advance RIDE | cancel RIDE
  nearby LAT LNG RADIUS_KM | all-drivers
  locate LAT LNG                           update the active driver's position
  route RIDE
  refresh | rides | drivers | metrics | help | quit";

impl Intent {
    pub fn parse(line: &str) -> Result<Intent, AppError> {
        let mut words = line.split_whitespace();
        let command = words
            .next()
            .ok_or_else(|| AppError::Precondition("empty command".to_string()))?;
        let args: Vec<&str> = words.collect();

        let intent = match (command, args.as_slice()) {
            ("rider", [name @ .., phone]) if !name.is_empty() => Intent::CreateRider {
                name: name.join(" "),
                phone: phone.to_string(),
            },
            ("use-rider", [id, key]) => Intent::UseRider {
                id: id.to_string(),
                credential: key.to_string(),
            },
            ("driver", [name, phone, make, model, plate, rest @ ..]) if rest.len() <= 1 => {
                Intent::CreateDriver {
                    name: name.to_string(),
                    phone: phone.to_string(),
                    make: make.to_string(),
                    model: model.to_string(),
                    plate: plate.to_string(),
                    color: rest.first().map(|c| c.to_string()),
                }
            }
            ("use-driver", [id, key]) => Intent::UseDriver {
                id: id.to_string(),
                credential: key.to_string(),
            },
            ("pickup" | "dropoff", [lat, lng]) => Intent::SetEndpoint {
                endpoint: endpoint(command)?,
                lat: lat.to_string(),
                lng: lng.to_string(),
            },
            ("distance", [km]) => Intent::SetDistance(km.to_string()),
            ("distance", []) => Intent::SetDistance(String::new()),
            ("duration", [min]) => Intent::SetDuration(min.to_string()),
            ("duration", []) => Intent::SetDuration(String::new()),
            ("search", terms) => Intent::Search(terms.join(" ")),
            ("results", []) => Intent::Results,
            ("fare", []) => Intent::Fare,
            ("pick", [index, which]) => Intent::Pick {
                index: index
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .ok_or_else(|| {
                        AppError::Precondition(format!("not a result number: {index}"))
                    })?,
                endpoint: endpoint(which)?,
            },
            ("request", []) => Intent::RequestRide,
            ("assign", [ride_id]) => Intent::Assign {
                ride_id: ride_id.to_string(),
                driver_id: None,
            },
            ("assign", [ride_id, driver_id]) => Intent::Assign {
                ride_id: ride_id.to_string(),
                driver_id: Some(driver_id.to_string()),
            },
            ("advance", [ride_id]) => Intent::Advance {
                ride_id: ride_id.to_string(),
            },
            ("cancel", [ride_id]) => Intent::Cancel {
                ride_id: ride_id.to_string(),
            },
            ("nearby", [lat, lng, radius]) => Intent::Nearby {
                lat: lat.to_string(),
                lng: lng.to_string(),
                radius_km: radius.to_string(),
            },
            ("all-drivers", []) => Intent::AllDrivers,
            ("locate", [lat, lng]) => Intent::Locate {
                lat: lat.to_string(),
                lng: lng.to_string(),
            },
            ("route", [ride_id]) => Intent::Route {
                ride_id: ride_id.to_string(),
            },
            ("refresh", []) => Intent::Refresh,
            ("rides", []) => Intent::ListRides,
            ("drivers", []) => Intent::ListDrivers,
            ("metrics", []) => Intent::Metrics,
            ("help", _) => Intent::Help,
            ("quit" | "exit", []) => Intent::Quit,
            _ => {
                return Err(AppError::Precondition(format!(
                    "unrecognized command: {}",
                    line.trim()
                )));
            }
        };

        Ok(intent)
    }
}

fn endpoint(word: &str) -> Result<Endpoint, AppError> {
    match word {
        "pickup" => Ok(Endpoint::Pickup),
        "dropoff" => Ok(Endpoint::Dropoff),
        other => Err(AppError::Precondition(format!(
            "expected pickup or dropoff, got {other}"
        ))),
    }
}
