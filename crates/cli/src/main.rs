use clap::{Parser, Subcommand, ValueEnum};
use clinic_cli::config_from_env;
use clinic_cli::menu::Menu;
use clinic_core::{
    parse_date, AppointmentDetails, AppointmentId, Clinic, DoctorId, EntityStore, PatientId,
    StoreBackend,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic scheduling CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive text menu
    Menu,
    /// List all records of one kind
    List {
        #[arg(value_enum)]
        kind: RecordKind,
    },
    /// Book an appointment
    Book {
        /// Doctor ID
        #[arg(long)]
        doctor: String,
        /// Patient ID
        #[arg(long)]
        patient: String,
        /// Appointment date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Free-text notes
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Cancel an appointment
    Cancel {
        /// Appointment ID
        appointment_id: String,
    },
    /// Check that doctor/patient associations match the stored appointments
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
enum RecordKind {
    Patients,
    Doctors,
    Offices,
    Appointments,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'clinic --help' for commands");
        return Ok(ExitCode::SUCCESS);
    };

    let config = config_from_env()?;
    match config.backend() {
        StoreBackend::File => {
            let clinic = Clinic::new(Arc::new(config.open_file_store()?));
            execute(&clinic, command)
        }
        StoreBackend::Memory => {
            let clinic = Clinic::new(Arc::new(config.open_memory_store()));
            execute(&clinic, command)
        }
    }
}

fn execute<S: EntityStore>(
    clinic: &Clinic<S>,
    command: Commands,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        Commands::Menu => {
            let stdin = std::io::stdin();
            Menu::new(clinic, stdin.lock(), std::io::stdout()).run()?;
        }
        Commands::List { kind } => list(clinic, kind)?,
        Commands::Book {
            doctor,
            patient,
            date,
            notes,
        } => {
            let details = AppointmentDetails::new(
                DoctorId::parse(&doctor)?,
                PatientId::parse(&patient)?,
                parse_date(&date)?,
                notes,
            );
            match clinic.appointments().create(details) {
                Ok(appointment) => println!("Booked {}", appointment),
                Err(e) => {
                    eprintln!("Error booking appointment: {}", e);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Commands::Cancel { appointment_id } => {
            let id = AppointmentId::parse(&appointment_id)?;
            match clinic.appointments().delete(id)? {
                Some(appointment) => println!("Cancelled {}", appointment),
                None => println!("Appointment not found."),
            }
        }
        Commands::Check => {
            let issues = clinic.appointments().check_associations()?;
            if issues.is_empty() {
                println!("All associations are consistent.");
            } else {
                for issue in &issues {
                    println!("{}", issue);
                }
                eprintln!("Found {} association issue(s)", issues.len());
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn list<S: EntityStore>(
    clinic: &Clinic<S>,
    kind: RecordKind,
) -> Result<(), Box<dyn std::error::Error>> {
    let lines: Vec<String> = match kind {
        RecordKind::Patients => clinic
            .patients()
            .list_all()?
            .iter()
            .map(ToString::to_string)
            .collect(),
        RecordKind::Doctors => clinic
            .doctors()
            .list_all()?
            .iter()
            .map(ToString::to_string)
            .collect(),
        RecordKind::Offices => clinic
            .offices()
            .list_all()?
            .iter()
            .map(ToString::to_string)
            .collect(),
        RecordKind::Appointments => clinic
            .appointments()
            .list_all()?
            .iter()
            .map(ToString::to_string)
            .collect(),
    };

    if lines.is_empty() {
        println!("No records found.");
    }
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}
