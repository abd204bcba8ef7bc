use std::io::Write;
use std::process::ExitCode;

use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use train_booker::domain::{CancelRequest, Carrier, SearchQuery, SeatClass, TrainOffer};
use train_booker::favorites::{FavoriteRoute, FavoritesStore, JsonFileFavorites};
use train_booker::gateway::{BookingClient, GatewayConfig};
use train_booker::manage::ReservationsManager;
use train_booker::reserve::{ReservationOrchestrator, ReserveState};
use train_booker::search::{SearchController, SearchState};

#[derive(Parser)]
#[command(name = "train-booker", about = "Search, reserve, and auto-retry train seats")]
struct Cli {
    /// Base URL of the booking provider API.
    #[arg(long, env = "BOOKING_API_URL", default_value = "http://127.0.0.1:5000")]
    api_url: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Path of the favorites file.
    #[arg(long, env = "BOOKING_FAVORITES", default_value = "favorites.json")]
    favorites: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct JourneyArgs {
    /// Carrier: SRT or KTX.
    #[arg(value_parser = Carrier::parse)]
    carrier: Carrier,

    /// Departure station.
    dep: String,

    /// Arrival station.
    arr: String,

    /// Travel date (YYYY-MM-DD, default today).
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Earliest departure time (HH:MM, default now).
    #[arg(long, value_parser = parse_time)]
    time: Option<NaiveTime>,

    /// Number of adult passengers.
    #[arg(long, default_value_t = 1)]
    adults: u32,
}

impl JourneyArgs {
    fn into_query(self) -> SearchQuery {
        let now = Local::now().naive_local();
        SearchQuery {
            carrier: self.carrier,
            departure: self.dep,
            arrival: self.arr,
            date: self.date.unwrap_or_else(|| now.date()),
            time: self.time.unwrap_or_else(|| now.time()),
            passengers: self.adults,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Search scheduled departures.
    Search(JourneyArgs),

    /// Reserve a seat on one train, auto-retrying while it is sold out.
    Reserve {
        #[command(flatten)]
        journey: JourneyArgs,

        /// Train number from the search results.
        train: String,

        /// Seat class (general or special; default: first open class).
        #[arg(long, value_parser = SeatClass::parse)]
        seat: Option<SeatClass>,
    },

    /// List existing reservations for both carriers.
    Reservations,

    /// Cancel (or refund, when ticketed) an existing reservation.
    Cancel {
        /// Cancellation key (PNR) from the reservation list.
        key: String,

        /// Carrier: SRT or KTX.
        #[arg(value_parser = Carrier::parse)]
        carrier: Carrier,

        /// The reservation has already been paid/ticketed.
        #[arg(long)]
        ticket: bool,

        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Manage saved routes.
    Favorites {
        #[command(subcommand)]
        action: FavoritesCommand,
    },
}

#[derive(Subcommand)]
enum FavoritesCommand {
    /// List saved routes.
    List,
    /// Save a route.
    Add {
        #[arg(value_parser = Carrier::parse)]
        carrier: Carrier,
        dep: String,
        arr: String,
    },
    /// Remove a saved route.
    Remove {
        #[arg(value_parser = Carrier::parse)]
        carrier: Carrier,
        dep: String,
        arr: String,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid date \"{s}\" (expected YYYY-MM-DD)"))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| format!("invalid time \"{s}\" (expected HH:MM)"))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = GatewayConfig::new(&cli.api_url).with_timeout(cli.timeout);
    let gateway = match BookingClient::new(config) {
        Ok(gateway) => gateway,
        Err(e) => {
            eprintln!("failed to create booking client: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Search(journey) => run_search(gateway, journey.into_query()).await,
        Command::Reserve {
            journey,
            train,
            seat,
        } => run_reserve(gateway, journey.into_query(), &train, seat).await,
        Command::Reservations => run_reservations(gateway).await,
        Command::Cancel {
            key,
            carrier,
            ticket,
            yes,
        } => run_cancel(gateway, key, carrier, ticket, yes).await,
        Command::Favorites { action } => run_favorites(&cli.favorites, action),
    }
}

async fn run_search(gateway: BookingClient, query: SearchQuery) -> ExitCode {
    let mut controller = SearchController::new(gateway);
    match controller.submit(query).await {
        SearchState::Loaded { query, results } => {
            println!("{} {} → {}", query.carrier, results.departure, results.arrival);
            if results.offers.is_empty() {
                println!("no trains found");
            }
            for offer in &results.offers {
                print_offer(offer);
            }
            ExitCode::SUCCESS
        }
        SearchState::Failed(message) => {
            eprintln!("search failed: {message}");
            ExitCode::FAILURE
        }
        _ => ExitCode::FAILURE,
    }
}

fn print_offer(offer: &TrainOffer) {
    println!(
        "  {} {}  {} {} → {} {}  [general: {}] [special: {}]",
        offer.train_name,
        offer.train_number,
        offer.departure_time.format("%H:%M"),
        offer.departure_station,
        offer.arrival_time.format("%H:%M"),
        offer.arrival_station,
        offer.general.label,
        offer.special.label,
    );
}

async fn run_reserve(
    gateway: BookingClient,
    query: SearchQuery,
    train: &str,
    seat: Option<SeatClass>,
) -> ExitCode {
    let mut controller = SearchController::new(gateway.clone());
    controller.submit(query).await;

    let (query, offer) = match (controller.query(), controller.results()) {
        (Some(query), Some(results)) => match results.offer(train) {
            Some(offer) => (Some(query.clone()), offer.clone()),
            None => {
                eprintln!("train {train} is not in the search results");
                return ExitCode::FAILURE;
            }
        },
        _ => {
            if let SearchState::Failed(message) = controller.state() {
                eprintln!("search failed: {message}");
            }
            return ExitCode::FAILURE;
        }
    };

    let seat_class = seat.unwrap_or_else(|| offer.default_seat_class());
    if !offer.seat(seat_class).available {
        println!(
            "{seat_class} seats on {} are sold out; retrying automatically (Ctrl-C to stop)",
            offer.train_number
        );
    }

    let mut orchestrator = ReservationOrchestrator::new(gateway);
    orchestrator.start_reservation(query, offer, seat_class).await;

    loop {
        match orchestrator.state() {
            ReserveState::RetryArmed => {
                if let Some(attempt) = orchestrator.live_attempt() {
                    println!("sold out; retry #{} in a few seconds", attempt.attempt_number);
                }
                let cancelled = tokio::select! {
                    _ = orchestrator.run_to_completion() => false,
                    _ = tokio::signal::ctrl_c() => true,
                };
                if cancelled {
                    orchestrator.cancel_retry();
                    println!("auto-retry stopped");
                    return ExitCode::SUCCESS;
                }
            }
            ReserveState::Confirmed(record) => {
                println!("reservation confirmed: {}", record.summary);
                if let Some(deadline) = record.payment_deadline {
                    println!("pay by {}", deadline.format("%Y-%m-%d %H:%M"));
                }
                return ExitCode::SUCCESS;
            }
            ReserveState::Failed(message) => {
                eprintln!("reservation failed: {message}");
                return ExitCode::FAILURE;
            }
            ReserveState::Idle | ReserveState::Attempting => return ExitCode::FAILURE,
        }
    }
}

async fn run_reservations(gateway: BookingClient) -> ExitCode {
    let mut manager = ReservationsManager::new(gateway);
    let lists = match manager.refresh().await {
        Ok(lists) => lists,
        Err(e) => {
            eprintln!("failed to fetch reservations: {}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    for carrier in [Carrier::Srt, Carrier::Ktx] {
        println!("{carrier} reservations:");
        match lists.for_carrier(carrier) {
            Ok(rows) if rows.is_empty() => println!("  (none)"),
            Ok(rows) => {
                for row in rows {
                    let status = if row.is_ticket {
                        "ticketed"
                    } else if row.is_waiting {
                        "waiting"
                    } else {
                        "reserved"
                    };
                    println!("  [{}] {} ({})", row.key, row.summary, status);
                }
            }
            Err(message) => println!("  fetch failed: {message}"),
        }
    }
    ExitCode::SUCCESS
}

async fn run_cancel(
    gateway: BookingClient,
    key: String,
    carrier: Carrier,
    ticket: bool,
    yes: bool,
) -> ExitCode {
    if !yes && !confirm(&format!("really cancel {carrier} reservation {key}?")) {
        println!("aborted");
        return ExitCode::SUCCESS;
    }

    let mut manager = ReservationsManager::new(gateway);
    let request = CancelRequest {
        key,
        carrier,
        is_ticket: ticket,
    };
    match manager.cancel(request).await {
        Ok(message) => {
            println!("{message}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("cancel failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

fn run_favorites(path: &str, action: FavoritesCommand) -> ExitCode {
    let mut store = JsonFileFavorites::open(path);
    match action {
        FavoritesCommand::List => {
            if store.routes().is_empty() {
                println!("no saved routes");
            }
            for route in store.routes() {
                println!("{} {} → {}", route.carrier, route.departure, route.arrival);
            }
            ExitCode::SUCCESS
        }
        FavoritesCommand::Add { carrier, dep, arr } => {
            let route = FavoriteRoute {
                carrier,
                departure: dep,
                arrival: arr,
            };
            match store.add(route) {
                Ok(()) => {
                    println!("saved");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{e}");
                    ExitCode::FAILURE
                }
            }
        }
        FavoritesCommand::Remove { carrier, dep, arr } => {
            let route = FavoriteRoute {
                carrier,
                departure: dep,
                arrival: arr,
            };
            match store.remove(&route) {
                Ok(()) => {
                    println!("removed");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
