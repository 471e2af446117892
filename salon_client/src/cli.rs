use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use salon_client::models::{AppointmentStatus, PageRequest, ServiceDraft, StaffDraft};

#[derive(Parser, Debug)]
#[command(name = "salon", author, version, about = "Book and manage salon appointments", long_about = None)]
pub struct Cli {
    /// File holding the login session (overrides SALON_SESSION_FILE)
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    /// Talk to every service on this host using the standard local ports
    #[arg(long, global = true)]
    pub local: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a customer account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "SALON_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Log in and keep the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SALON_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in profile
    Whoami,
    /// Manage your profile
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
    /// Browse the service catalog
    Services {
        #[command(subcommand)]
        action: ServicesCommand,
    },
    /// Browse staff and their free slots
    Staff {
        #[command(subcommand)]
        action: StaffCommand,
    },
    /// Book an appointment
    Book(BookArgs),
    /// Your appointments
    Appointments {
        #[command(subcommand)]
        action: AppointmentsCommand,
    },
    /// Salon administration
    Admin {
        #[command(subcommand)]
        action: AdminCommand,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Items per page
    #[arg(long, default_value_t = 10)]
    pub limit: u32,
}

impl PageArgs {
    pub fn request(self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Change name or phone
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Change password
    Password {
        #[arg(long, env = "SALON_PASSWORD", hide_env_values = true)]
        current: String,
        #[arg(long)]
        new: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ServicesCommand {
    List(PageArgs),
    Show { id: Uuid },
}

#[derive(Subcommand, Debug)]
pub enum StaffCommand {
    List(PageArgs),
    Show {
        id: Uuid,
    },
    /// Free slots for one day
    Availability {
        id: Uuid,
        #[arg(long)]
        date: NaiveDate,
    },
}

#[derive(Args, Debug)]
pub struct BookArgs {
    #[arg(long)]
    pub service: Uuid,
    #[arg(long)]
    pub staff: Uuid,
    #[arg(long)]
    pub slot: Uuid,
    /// Day the slot is on, today if omitted
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum AppointmentsCommand {
    Mine(PageArgs),
    Show { id: Uuid },
    Cancel { id: Uuid },
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    Staff {
        #[command(subcommand)]
        action: AdminStaffCommand,
    },
    Services {
        #[command(subcommand)]
        action: AdminServicesCommand,
    },
    Customers {
        #[command(subcommand)]
        action: CustomersCommand,
    },
    Appointments {
        #[command(subcommand)]
        action: AdminAppointmentsCommand,
    },
    Analytics {
        #[command(subcommand)]
        action: AnalyticsCommand,
    },
}

#[derive(Args, Debug, Clone)]
pub struct StaffFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    /// Repeat for several specialties
    #[arg(long = "specialty")]
    pub specialties: Vec<String>,
    #[arg(long)]
    pub inactive: bool,
}

impl From<StaffFields> for StaffDraft {
    fn from(fields: StaffFields) -> Self {
        StaffDraft {
            name: fields.name,
            email: fields.email,
            phone: fields.phone,
            specialties: fields.specialties,
            active: !fields.inactive,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum AdminStaffCommand {
    Create(StaffFields),
    Update {
        id: Uuid,
        #[command(flatten)]
        fields: StaffFields,
    },
    Delete {
        id: Uuid,
    },
    AddSlot {
        staff_id: Uuid,
        /// RFC 3339, e.g. 2025-06-02T09:00:00Z
        #[arg(long)]
        start: DateTime<Utc>,
        #[arg(long)]
        end: DateTime<Utc>,
    },
    RemoveSlot {
        staff_id: Uuid,
        slot_id: Uuid,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ServiceFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub price: f64,
    #[arg(long)]
    pub duration: u32,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub inactive: bool,
}

impl From<ServiceFields> for ServiceDraft {
    fn from(fields: ServiceFields) -> Self {
        ServiceDraft {
            name: fields.name,
            description: fields.description,
            price: fields.price,
            duration_minutes: fields.duration,
            category: fields.category,
            active: !fields.inactive,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum AdminServicesCommand {
    Create(ServiceFields),
    Update {
        id: Uuid,
        #[command(flatten)]
        fields: ServiceFields,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Subcommand, Debug)]
pub enum CustomersCommand {
    List(PageArgs),
    Delete { id: Uuid },
}

#[derive(Subcommand, Debug)]
pub enum AdminAppointmentsCommand {
    List {
        #[arg(long)]
        status: Option<AppointmentStatus>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        staff: Option<Uuid>,
        #[command(flatten)]
        page: PageArgs,
    },
    Status {
        id: Uuid,
        status: AppointmentStatus,
    },
}

#[derive(Subcommand, Debug)]
pub enum AnalyticsCommand {
    Revenue {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    Popular {
        #[arg(long, default_value_t = 5)]
        limit: u32,
    },
    Staff {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    Insights,
}
