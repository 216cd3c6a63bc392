use std::collections::HashSet;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use dialoguer::{theme::ColorfulTheme, Select};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use backend::Backend;
use calendar::FestivalStatus;
use config::Config;
use error::{Result, YatraError};
use forms::{ArtisanForm, ProductForm};
use nearby::DISPLAY_CAP;
use store::Store;
use supabase::SupabaseClient;
use types::{Coordinates, FestivalCalendar, PlaceDetail, ProductListing, SortKey};

mod backend;
mod calendar;
mod config;
mod error;
mod forms;
mod nearby;
mod portal;
mod store;
mod supabase;
mod types;

#[derive(Parser)]
#[command(name = "yatra")]
#[command(version)]
#[command(about = "A command line tourism portal", long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit or update an artisan profile
    Register(RegisterArgs),
    /// Post a marketplace product
    Product(ProductArgs),
    /// List places and festivals of a state
    Explore(ExploreArgs),
    /// List the festivals of a state
    Festivals {
        /// Prompted for when omitted
        state: Option<String>,
        /// Ask the backend to fetch festivals for the state first
        #[arg(long)]
        fetch: bool,
    },
    /// Dated festival calendar of a state
    Calendar {
        /// Prompted for when omitted
        state: Option<String>,
    },
    /// Newest products from artisans
    Marketplace,
    /// Show the full guide for a place
    Detail {
        place_id: String,
        #[arg(long)]
        state: Option<String>,
        /// Keep a copy in the local offline store
        #[arg(long)]
        save: bool,
    },
    /// Places around a coordinate
    Nearby(NearbyArgs),
    /// Saved places of a user
    #[command(subcommand)]
    Wishlist(WishlistCommand),
    /// Places saved for offline viewing
    #[command(subcommand)]
    Offline(OfflineCommand),
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(long)]
    user_id: String,
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    lat: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    lon: f64,
    /// Comma separated
    #[arg(long, default_value = "")]
    skills: String,
    #[arg(long, default_value = "")]
    story: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long, default_value = "")]
    email: String,
}

#[derive(Args)]
struct ProductArgs {
    #[arg(long)]
    artisan_id: String,
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    category: String,
    #[arg(long, default_value_t = 0.0)]
    price: f64,
    #[arg(long, default_value_t = 0)]
    stock: u32,
    /// A jpg, jpeg or png file
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Args)]
struct ExploreArgs {
    /// Prompted for when omitted
    state: Option<String>,
    /// Ask the backend to fetch places for the state first
    #[arg(long)]
    fetch_places: bool,
    #[arg(long)]
    fetch_festivals: bool,
    /// Pick a place from the list and show its detail
    #[arg(short, long)]
    pick: bool,
}

#[derive(Args)]
struct NearbyArgs {
    #[arg(long, default_value_t = 23.36, allow_negative_numbers = true)]
    lat: f64,
    #[arg(long, default_value_t = 85.33, allow_negative_numbers = true)]
    lon: f64,
    #[arg(short, long, default_value_t = 50.0, allow_negative_numbers = true)]
    radius: f64,
    /// May be repeated
    #[arg(short = 't', long = "type")]
    types: Vec<String>,
    #[arg(short, long, value_enum, default_value_t = SortKey::Distance)]
    sort: SortKey,
    /// Save the listed place with this id to the wishlist of --user
    #[arg(long, requires = "user")]
    save: Option<String>,
    #[arg(long)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum WishlistCommand {
    Add { user_id: String, place_id: String },
    Show { user_id: String },
}

#[derive(Subcommand)]
enum OfflineCommand {
    List,
    Show { place_id: String },
    Remove { place_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let command = match args.command {
        Command::Offline(command) => return offline(&config::db_path()?, command),
        command => command,
    };

    let config = Config::load()?;
    debug!(url = %config.supabase_url, db = %config.db_path.display(), "configuration loaded");
    let backend = SupabaseClient::new(&config)?;

    match command {
        Command::Register(a) => {
            let form = ArtisanForm {
                user_id: a.user_id,
                display_name: a.name,
                address: a.address,
                lat: a.lat,
                lon: a.lon,
                skills: a.skills,
                story: a.story,
                contact_phone: a.phone,
                contact_email: a.email,
            };
            let profile = portal::register_artisan(&backend, form).await?;
            println!(
                "Artisan profile for {} submitted. Awaiting verification.",
                profile.artisan_id
            );
        }
        Command::Product(a) => {
            let form = ProductForm {
                artisan_id: a.artisan_id,
                title: a.title,
                description: a.description,
                category: a.category,
                price: a.price,
                stock: a.stock,
            };
            let product = portal::post_product(&backend, form, a.image.as_deref()).await?;
            println!("Product posted: {}", product.title);
            for url in &product.images {
                println!("  image: {url}");
            }
        }
        Command::Explore(a) => explore(&backend, &config, a).await?,
        Command::Festivals { state, fetch } => {
            let state = pick_state(state)?;
            let (summary, festivals) = portal::festivals(&backend, &state, fetch).await?;
            if let Some(summary) = summary {
                println!("Fetched {} festivals for {}", summary.count, summary.state);
            }
            println!("Festivals in {state}");
            for festival in &festivals {
                println!("  {}", festival.label());
                if let Some(desc) = &festival.short_desc {
                    println!("    {desc}");
                }
                if let Some(long) = &festival.long_desc {
                    println!("    {long}");
                }
            }
        }
        Command::Calendar { state } => {
            let state = pick_state(state)?;
            let calendar = portal::festival_calendar(&backend, &state).await?;
            print_calendar(&state, &calendar);
        }
        Command::Marketplace => {
            let products = portal::marketplace(&backend).await?;
            if products.is_empty() {
                println!("No products yet");
            }
            for product in &products {
                print_listing(product);
            }
        }
        Command::Detail {
            place_id,
            state,
            save,
        } => {
            let detail = portal::place_detail(&backend, &place_id, state.as_deref()).await?;
            print_detail(&detail);
            if save {
                save_offline(&config, &detail)?;
            }
        }
        Command::Nearby(a) => nearby(&backend, a).await?,
        Command::Wishlist(WishlistCommand::Add { user_id, place_id }) => {
            let (wishlist, added) = portal::save_to_wishlist(&backend, &user_id, &place_id).await?;
            match added {
                true => println!("Saved to wishlist ({} places)", wishlist.place_ids.len()),
                false => println!("Already in wishlist"),
            }
        }
        Command::Wishlist(WishlistCommand::Show { user_id }) => {
            match backend.get_wishlist(&user_id).await? {
                Some(wishlist) if !wishlist.place_ids.is_empty() => {
                    for id in wishlist.place_ids {
                        println!("{id}");
                    }
                }
                _ => println!("Wishlist is empty"),
            }
        }
        Command::Offline(_) => unreachable!("handled before the backend is configured"),
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "yatra=debug" } else { "yatra=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn pick_state(state: Option<String>) -> Result<String> {
    if let Some(state) = state {
        return Ok(state);
    }
    let index = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select state")
        .items(&portal::STATES)
        .default(0)
        .interact()?;
    Ok(portal::STATES[index].to_string())
}

async fn explore(backend: &dyn Backend, config: &Config, args: ExploreArgs) -> Result<()> {
    let state = pick_state(args.state)?;

    let exploration =
        portal::explore(backend, &state, args.fetch_places, args.fetch_festivals).await?;
    if let Some(summary) = &exploration.places_fetch {
        println!(
            "Fetched places for {}: {} received, {} inserted",
            summary.state, summary.received, summary.inserted
        );
        for failure in &summary.failed {
            println!("  failed: {} ({})", failure.name, failure.error);
        }
    }
    if let Some(summary) = &exploration.festivals_fetch {
        println!("Fetched {} festivals for {}", summary.count, summary.state);
    }

    println!("Places in {state}");
    for place in &exploration.places {
        println!("  {}", place.name);
        if let Some(desc) = &place.short_desc {
            println!("    {desc}");
        }
        if let Some(image) = place.images.first() {
            println!("    {image}");
        }
    }
    if !exploration.festivals.is_empty() {
        println!("Festivals");
        for festival in &exploration.festivals {
            println!("  {}", festival.label());
            if let Some(desc) = &festival.short_desc {
                println!("    {desc}");
            }
            if let Some(long) = &festival.long_desc {
                println!("    {long}");
            }
        }
    }

    if args.pick && !exploration.places.is_empty() {
        let options: Vec<&str> = exploration.places.iter().map(|p| p.name.as_str()).collect();
        let index = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Show details for")
            .items(&options)
            .default(0)
            .interact()?;
        let place = &exploration.places[index];
        let detail = portal::place_detail(backend, &place.id, Some(&state)).await?;
        print_detail(&detail);
        let save = dialoguer::Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Save offline?")
            .default(false)
            .interact()?;
        if save {
            save_offline(config, &detail)?;
        }
    }
    Ok(())
}

async fn nearby(backend: &dyn Backend, args: NearbyArgs) -> Result<()> {
    let origin = Coordinates::new(args.lat, args.lon)?;
    let types: HashSet<String> = args.types.into_iter().collect();
    let results = portal::nearby(backend, origin, args.radius, &types, args.sort).await?;

    println!("Results: {} within {} km", results.len(), args.radius);
    for result in results.iter().take(DISPLAY_CAP) {
        println!(
            "  [{}] {} - {:.1} km",
            result.place.id, result.place.name, result.distance_km
        );
        if let Some(desc) = &result.place.short_desc {
            println!("    {desc}");
        }
    }

    if let (Some(place_id), Some(user)) = (args.save, args.user) {
        if !results.iter().any(|r| r.place.id == place_id) {
            return Err(YatraError::NotFound(format!(
                "place {place_id} is not among the results"
            )));
        }
        portal::save_to_wishlist(backend, &user, &place_id).await?;
        println!("Saved to wishlist");
    }
    Ok(())
}

fn print_calendar(state: &str, calendar: &FestivalCalendar) {
    if calendar.fallback {
        println!("Showing approximate dates, the calendar service was unavailable");
    } else if calendar.cached {
        println!("(cached)");
    }
    println!("Festival calendar for {state}");
    let today = chrono::Local::now().date_naive();
    for festival in &calendar.festivals {
        let when = match calendar::days_until(festival, today) {
            Some(days) => calendar::describe_days(days),
            None => "Date to be announced".to_string(),
        };
        let marker = match calendar::status(festival, today) {
            FestivalStatus::Past => "past",
            FestivalStatus::Soon => "soon",
            FestivalStatus::Upcoming => "upcoming",
        };
        println!("  {} [{marker}] {when}", festival.name);
        if let Some(date) = &festival.festival_date {
            let estimate = if festival.estimated_date { " (estimated)" } else { "" };
            println!("    {date}{estimate}, {} day(s)", festival.duration_days);
        }
        if let Some(desc) = &festival.description {
            println!("    {desc}");
        }
        if let Some(significance) = &festival.significance {
            println!("    {significance}");
        }
        if !festival.traditions.is_empty() {
            println!("    Traditions: {}", festival.traditions.join(", "));
        }
    }
}

fn print_listing(product: &ProductListing) {
    let price = product
        .price
        .map_or_else(|| "price on request".to_string(), |p| format!("Rs {p:.2}"));
    println!("[{}] {} - {price}", product.product_id, product.title);
    if let Some(category) = &product.category {
        println!("    {category}");
    }
    if let Some(desc) = &product.description {
        println!("    {desc}");
    }
    if let Some(image) = product.images.first() {
        println!("    {image}");
    }
    for key in ["phone", "email"] {
        if let Some(value) = product.contact_info.get(key).and_then(|v| v.as_str()) {
            println!("    {key}: {value}");
        }
    }
}

fn print_detail(detail: &PlaceDetail) {
    println!("{}", detail.name);
    if let Some(state) = &detail.state {
        println!("{state}");
    }
    if let Some(long) = &detail.long_desc {
        println!("\n{long}\n");
    }
    if let Some(links) = portal::map_links(detail) {
        println!("Route: {}", links.route);
        println!("Map view: {}", links.map_view);
    }
    for image in &detail.images {
        println!("Image: {image}");
    }
    if !detail.gemini.is_null() {
        match serde_json::to_string_pretty(&detail.gemini) {
            Ok(guide) => println!("{guide}"),
            Err(e) => debug!("could not render guide: {e}"),
        }
    }
}

fn open_store(db_path: &Path) -> Result<Store> {
    Store::new(&db_path.to_string_lossy())
}

fn save_offline(config: &Config, detail: &PlaceDetail) -> Result<()> {
    let saved = open_store(&config.db_path)?.save_place(detail)?;
    println!(
        "Saved {} offline at {}",
        saved.detail.name,
        saved.saved_at.format("%Y-%m-%d %H:%M")
    );
    Ok(())
}

fn offline(db_path: &Path, command: OfflineCommand) -> Result<()> {
    let store = open_store(db_path)?;
    match command {
        OfflineCommand::List => {
            for saved in store.list_places()? {
                println!(
                    "[{}] {} (saved {})",
                    saved.detail.place_id,
                    saved.detail.name,
                    saved.saved_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        OfflineCommand::Show { place_id } => match store.get_place(&place_id)? {
            Some(saved) => print_detail(&saved.detail),
            None => return Err(YatraError::NotFound(format!("no offline copy of {place_id}"))),
        },
        OfflineCommand::Remove { place_id } => {
            if !store.remove_place(&place_id)? {
                return Err(YatraError::NotFound(format!("no offline copy of {place_id}")));
            }
            println!("Removed {place_id}");
        }
    }
    Ok(())
}
