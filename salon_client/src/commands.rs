use chrono::Utc;

use salon_client::booking::BookingWizard;
use salon_client::models::{
    Appointment, AppointmentFilter, AvailabilitySlot, DateRange, LoginRequest, Page,
    PasswordChange, ProfileUpdate, RegisterRequest, Service, ServiceDraft, SlotDraft, Staff,
    StaffDraft, User,
};
use salon_client::{ApiResult, ClientError, SalonContext};

use crate::cli::{
    AdminAppointmentsCommand, AdminCommand, AdminServicesCommand, AdminStaffCommand,
    AnalyticsCommand, AppointmentsCommand, BookArgs, Command, CustomersCommand, ProfileCommand,
    ServicesCommand, StaffCommand,
};

/// Runs one command. Failures are raised as error toasts before being returned.
pub async fn run(ctx: &SalonContext, command: Command) -> ApiResult<()> {
    let result = dispatch(ctx, command).await;
    if let Err(e) = &result {
        ctx.toasts.error(e.user_message());
    }
    result
}

async fn dispatch(ctx: &SalonContext, command: Command) -> ApiResult<()> {
    match command {
        Command::Register {
            name,
            email,
            password,
            phone,
        } => {
            let user = ctx
                .users
                .register(&RegisterRequest {
                    name,
                    email,
                    password,
                    phone,
                })
                .await?;
            ctx.toasts
                .success(format!("Account created for {}. You can log in now.", user.email));
        }
        Command::Login { email, password } => {
            ctx.users.login(&LoginRequest { email, password }).await?;
            let profile = ctx.users.profile().await?;
            ctx.toasts.success(format!("Welcome back, {}", profile.name));
        }
        Command::Logout => {
            ctx.users.logout();
            ctx.toasts.info("Logged out");
        }
        Command::Whoami => {
            if !ctx.users.is_logged_in() {
                ctx.toasts.warning("Not logged in");
                return Ok(());
            }
            print!("{}", user_card(&ctx.users.profile().await?));
        }
        Command::Profile { action } => profile(ctx, action).await?,
        Command::Services { action } => services(ctx, action).await?,
        Command::Staff { action } => staff(ctx, action).await?,
        Command::Book(args) => book(ctx, args).await?,
        Command::Appointments { action } => appointments(ctx, action).await?,
        Command::Admin { action } => {
            require_admin(ctx).await?;
            admin(ctx, action).await?;
        }
    }
    Ok(())
}

async fn profile(ctx: &SalonContext, action: ProfileCommand) -> ApiResult<()> {
    match action {
        ProfileCommand::Update { name, phone } => {
            let user = ctx.users.update_profile(&ProfileUpdate { name, phone }).await?;
            ctx.toasts.success("Profile updated");
            print!("{}", user_card(&user));
        }
        ProfileCommand::Password { current, new } => {
            ctx.users
                .change_password(&PasswordChange {
                    current_password: current,
                    new_password: new,
                })
                .await?;
            ctx.toasts.success("Password changed");
        }
    }
    Ok(())
}

async fn services(ctx: &SalonContext, action: ServicesCommand) -> ApiResult<()> {
    match action {
        ServicesCommand::List(page) => {
            let page = ctx.catalog.list(page.request()).await?;
            print!("{}", service_table(&page));
        }
        ServicesCommand::Show { id } => {
            let service = ctx.catalog.get(id).await?;
            print!("{}", service_card(&service));
        }
    }
    Ok(())
}

async fn staff(ctx: &SalonContext, action: StaffCommand) -> ApiResult<()> {
    match action {
        StaffCommand::List(page) => {
            let page = ctx.staff.list(page.request()).await?;
            print!("{}", staff_table(&page));
        }
        StaffCommand::Show { id } => {
            let member = ctx.staff.get(id).await?;
            print!("{}", staff_card(&member));
        }
        StaffCommand::Availability { id, date } => {
            let slots = ctx.staff.availability(id, date).await?;
            if slots.is_empty() {
                ctx.toasts.info(format!("No slots on {date}"));
            }
            print!("{}", slot_table(&slots));
        }
    }
    Ok(())
}

async fn book(ctx: &SalonContext, args: BookArgs) -> ApiResult<()> {
    let mut wizard = BookingWizard::new();
    wizard.choose_service(ctx.catalog.get(args.service).await?)?;
    wizard.choose_staff(ctx.staff.get(args.staff).await?)?;

    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
    let slot = ctx
        .staff
        .availability(args.staff, date)
        .await?
        .into_iter()
        .find(|slot| slot.id == args.slot)
        .ok_or_else(|| {
            ClientError::Booking(format!("slot {} is not offered on {date}", args.slot))
        })?;
    wizard.choose_slot(slot, Utc::now())?;
    wizard.set_notes(args.notes);

    let appointment = wizard.submit(&ctx.appointments).await?;
    ctx.toasts.success(format!(
        "Booked for {}",
        appointment.start_time.format("%a %d %b %Y %H:%M UTC")
    ));
    print!("{}", appointment_card(&appointment));
    Ok(())
}

async fn appointments(ctx: &SalonContext, action: AppointmentsCommand) -> ApiResult<()> {
    match action {
        AppointmentsCommand::Mine(page) => {
            let page = ctx.appointments.mine(page.request()).await?;
            print!("{}", appointment_table(&page));
        }
        AppointmentsCommand::Show { id } => {
            let appointment = ctx.appointments.get(id).await?;
            print!("{}", appointment_card(&appointment));
        }
        AppointmentsCommand::Cancel { id } => {
            ctx.appointments.cancel(id).await?;
            ctx.toasts.success("Appointment cancelled");
        }
    }
    Ok(())
}

async fn require_admin(ctx: &SalonContext) -> ApiResult<()> {
    if !ctx.users.is_logged_in() {
        return Err(ClientError::PermissionDenied("log in as an administrator first".into()));
    }
    let profile = ctx.users.profile().await?;
    if !profile.role.is_admin() {
        return Err(ClientError::PermissionDenied(format!(
            "{} is not an administrator",
            profile.email
        )));
    }
    Ok(())
}

async fn admin(ctx: &SalonContext, action: AdminCommand) -> ApiResult<()> {
    match action {
        AdminCommand::Staff { action } => match action {
            AdminStaffCommand::Create(fields) => {
                let member = ctx.staff.create(&StaffDraft::from(fields)).await?;
                ctx.toasts.success(format!("Added {}", member.name));
                print!("{}", staff_card(&member));
            }
            AdminStaffCommand::Update { id, fields } => {
                let member = ctx.staff.update(id, &StaffDraft::from(fields)).await?;
                ctx.toasts.success(format!("Updated {}", member.name));
            }
            AdminStaffCommand::Delete { id } => {
                ctx.staff.delete(id).await?;
                ctx.toasts.success("Staff member removed");
            }
            AdminStaffCommand::AddSlot { staff_id, start, end } => {
                let slot = ctx
                    .staff
                    .add_slot(staff_id, &SlotDraft { start_time: start, end_time: end })
                    .await?;
                ctx.toasts.success(format!("Slot {} added", slot.id));
            }
            AdminStaffCommand::RemoveSlot { staff_id, slot_id } => {
                ctx.staff.remove_slot(staff_id, slot_id).await?;
                ctx.toasts.success("Slot removed");
            }
        },
        AdminCommand::Services { action } => match action {
            AdminServicesCommand::Create(fields) => {
                let service = ctx.catalog.create(&ServiceDraft::from(fields)).await?;
                ctx.toasts.success(format!("Added {}", service.name));
                print!("{}", service_card(&service));
            }
            AdminServicesCommand::Update { id, fields } => {
                let service = ctx.catalog.update(id, &ServiceDraft::from(fields)).await?;
                ctx.toasts.success(format!("Updated {}", service.name));
            }
            AdminServicesCommand::Delete { id } => {
                ctx.catalog.delete(id).await?;
                ctx.toasts.success("Service removed");
            }
        },
        AdminCommand::Customers { action } => match action {
            CustomersCommand::List(page) => {
                let page = ctx.users.list_customers(page.request()).await?;
                print!("{}", customer_table(&page));
            }
            CustomersCommand::Delete { id } => {
                ctx.users.delete_customer(id).await?;
                ctx.toasts.success("Customer removed");
            }
        },
        AdminCommand::Appointments { action } => match action {
            AdminAppointmentsCommand::List {
                status,
                date,
                staff,
                page,
            } => {
                let filter = AppointmentFilter {
                    status,
                    date,
                    staff_id: staff,
                };
                let page = ctx.appointments.list(&filter, page.request()).await?;
                print!("{}", appointment_table(&page));
            }
            AdminAppointmentsCommand::Status { id, status } => {
                let appointment = ctx.appointments.update_status(id, status).await?;
                ctx.toasts
                    .success(format!("Appointment is now {}", appointment.status));
            }
        },
        AdminCommand::Analytics { action } => analytics(ctx, action).await?,
    }
    Ok(())
}

async fn analytics(ctx: &SalonContext, action: AnalyticsCommand) -> ApiResult<()> {
    let mut out = String::new();
    match action {
        AnalyticsCommand::Revenue { start, end } => {
            let summary = ctx.analytics.revenue(DateRange { start, end }).await?;
            out += &format!("Revenue {start} .. {end}\n");
            out += &format!("  total          {:>10.2}\n", summary.total_revenue);
            out += &format!("  appointments   {:>10}\n", summary.appointment_count);
            out += &format!("  average ticket {:>10.2}\n", summary.average_ticket);
            for point in &summary.daily {
                out += &format!(
                    "  {}  {:>10.2}  ({} appts)\n",
                    point.date, point.revenue, point.appointments
                );
            }
        }
        AnalyticsCommand::Popular { limit } => {
            for (rank, entry) in ctx.analytics.popular_services(limit).await?.iter().enumerate() {
                out += &format!(
                    "{:>2}. {:<30} {:>5} bookings {:>10.2}\n",
                    rank + 1,
                    entry.service_name,
                    entry.bookings,
                    entry.revenue
                );
            }
        }
        AnalyticsCommand::Staff { start, end } => {
            for entry in ctx.analytics.staff_performance(DateRange { start, end }).await? {
                out += &format!(
                    "{:<24} {:>5} appts {:>10.2} {:>5.1}% completed\n",
                    entry.staff_name,
                    entry.appointments,
                    entry.revenue,
                    entry.completion_rate * 100.0
                );
            }
        }
        AnalyticsCommand::Insights => {
            let insights = ctx.analytics.insights().await?;
            if let Some(day) = &insights.busiest_day {
                out += &format!("Busiest day:      {day}\n");
            }
            if let Some(hour) = insights.busiest_hour {
                out += &format!("Busiest hour:     {hour:02}:00\n");
            }
            out += &format!("Repeat customers: {:.1}%\n", insights.repeat_customer_rate * 100.0);
            out += &format!("Cancellations:    {:.1}%\n", insights.cancellation_rate * 100.0);
            for tip in &insights.recommendations {
                out += &format!("  - {tip}\n");
            }
        }
    }
    print!("{out}");
    Ok(())
}

fn page_footer<T>(out: &mut String, page: &Page<T>) {
    *out += &format!(
        "page {} of {} ({} total)\n",
        page.page,
        page.total_pages().max(1),
        page.total
    );
}

fn user_card(user: &User) -> String {
    let mut out = String::new();
    out += &format!("{} <{}>\n", user.name, user.email);
    out += &format!("  id:    {}\n", user.id);
    out += &format!("  role:  {:?}\n", user.role);
    if let Some(phone) = &user.phone {
        out += &format!("  phone: {phone}\n");
    }
    out
}

fn service_card(service: &Service) -> String {
    let mut out = String::new();
    out += &format!("{} ({})\n", service.name, service.id);
    out += &format!("  {:.2} / {} min\n", service.price, service.duration_minutes);
    if let Some(category) = &service.category {
        out += &format!("  category: {category}\n");
    }
    if let Some(description) = &service.description {
        out += &format!("  {description}\n");
    }
    if !service.active {
        out += &format!("  (not currently offered)\n");
    }
    out
}

fn service_table(page: &Page<Service>) -> String {
    let mut out = String::new();
    for service in &page.items {
        out += &format!(
            "{}  {:<28} {:>8.2} {:>4} min\n",
            service.id, service.name, service.price, service.duration_minutes
        );
    }
    page_footer(&mut out, page);
    out
}

fn staff_card(member: &Staff) -> String {
    let mut out = String::new();
    out += &format!("{} ({})\n", member.name, member.id);
    if !member.specialties.is_empty() {
        out += &format!("  specialties: {}\n", member.specialties.join(", "));
    }
    if let Some(email) = &member.email {
        out += &format!("  email: {email}\n");
    }
    if !member.active {
        out += &format!("  (inactive)\n");
    }
    out
}

fn staff_table(page: &Page<Staff>) -> String {
    let mut out = String::new();
    for member in &page.items {
        out += &format!(
            "{}  {:<24} {}\n",
            member.id,
            member.name,
            member.specialties.join(", ")
        );
    }
    page_footer(&mut out, page);
    out
}

fn slot_table(slots: &[AvailabilitySlot]) -> String {
    let mut out = String::new();
    for slot in slots {
        out += &format!(
            "{}  {} - {}{}\n",
            slot.id,
            slot.start_time.format("%H:%M"),
            slot.end_time.format("%H:%M"),
            if slot.is_available { "" } else { "  (taken)" }
        );
    }
    out
}

fn appointment_card(appointment: &Appointment) -> String {
    let mut out = String::new();
    out += &format!("Appointment {}\n", appointment.id);
    out += &format!("  when:    {}\n", appointment.start_time.format("%Y-%m-%d %H:%M UTC"));
    out += &format!("  status:  {}\n", appointment.status);
    out += &format!("  service: {}\n", appointment.service_id);
    out += &format!("  staff:   {}\n", appointment.staff_id);
    if let Some(notes) = &appointment.notes {
        out += &format!("  notes:   {notes}\n");
    }
    out
}

fn appointment_table(page: &Page<Appointment>) -> String {
    let mut out = String::new();
    for appointment in &page.items {
        out += &format!(
            "{}  {}  {:<10}\n",
            appointment.id,
            appointment.start_time.format("%Y-%m-%d %H:%M"),
            appointment.status
        );
    }
    page_footer(&mut out, page);
    out
}

fn customer_table(page: &Page<User>) -> String {
    let mut out = String::new();
    for user in &page.items {
        out += &format!(
            "{}  {:<24} {:<30} {}\n",
            user.id,
            user.name,
            user.email,
            user.phone.as_deref().unwrap_or("-")
        );
    }
    page_footer(&mut out, page);
    out
}
