//! Interactive text menu.
//!
//! ```text
//! 1. Patients  2. Doctors  3. Appointments  4. Offices  5. Exit
//! ```
//!
//! Each entity sub-menu offers Create, Read, Update, Delete and List. Input errors (a malformed
//! id, a bad date, a blank name) and rejected operations print the error and return to the main
//! menu. End of input behaves like choosing Exit.

use chrono::NaiveDate;
use clinic_core::{
    parse_date, Appointment, AppointmentDetails, AppointmentId, Clinic, ClinicError,
    DoctorDetails, DoctorId, EmailAddress, EntityStore, OfficeDetails, OfficeId, PatientDetails,
    PatientId,
};
use std::io::{self, BufRead, Write};

#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    #[error("end of input")]
    EndOfInput,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Clinic(#[from] ClinicError),
}

type MenuResult<T> = Result<T, MenuError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Create,
    Read,
    Update,
    Delete,
    List,
}

/// Text menu over any line-oriented input and output.
pub struct Menu<'a, S, R, W> {
    clinic: &'a Clinic<S>,
    input: R,
    output: W,
}

impl<'a, S, R, W> Menu<'a, S, R, W>
where
    S: EntityStore,
    R: BufRead,
    W: Write,
{
    pub fn new(clinic: &'a Clinic<S>, input: R, output: W) -> Self {
        Self {
            clinic,
            input,
            output,
        }
    }

    /// Runs until the user exits or input ends.
    ///
    /// # Errors
    ///
    /// Only I/O failures on the menu streams are returned; clinic errors are printed.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.output)?;
            writeln!(self.output, "Clinic")?;
            writeln!(self.output, "1. Patients")?;
            writeln!(self.output, "2. Doctors")?;
            writeln!(self.output, "3. Appointments")?;
            writeln!(self.output, "4. Offices")?;
            writeln!(self.output, "5. Exit")?;

            let outcome = match self.prompt("Enter choice: ") {
                Ok(choice) => match choice.as_str() {
                    "1" => self.patients(),
                    "2" => self.doctors(),
                    "3" => self.appointments(),
                    "4" => self.offices(),
                    "5" => break,
                    _ => {
                        writeln!(self.output, "Invalid choice.")?;
                        continue;
                    }
                },
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => {}
                Err(MenuError::EndOfInput) => break,
                Err(MenuError::Io(e)) => return Err(e),
                Err(MenuError::Clinic(e)) => {
                    tracing::debug!("menu operation failed: {}", e);
                    writeln!(self.output, "Error: {e}")?;
                }
            }
        }

        writeln!(self.output, "Goodbye.")?;
        self.output.flush()
    }

    fn prompt(&mut self, label: &str) -> MenuResult<String> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(MenuError::EndOfInput);
        }
        Ok(line.trim().to_string())
    }

    fn prompt_optional(&mut self, label: &str) -> MenuResult<Option<String>> {
        let value = self.prompt(label)?;
        Ok((!value.is_empty()).then_some(value))
    }

    fn prompt_date(&mut self, label: &str) -> MenuResult<NaiveDate> {
        let value = self.prompt(label)?;
        Ok(parse_date(&value)?)
    }

    fn prompt_email(&mut self, label: &str) -> MenuResult<Option<EmailAddress>> {
        match self.prompt_optional(label)? {
            Some(value) => Ok(Some(
                EmailAddress::parse(&value).map_err(ClinicError::from)?,
            )),
            None => Ok(None),
        }
    }

    /// Shows an entity sub-menu and returns the chosen action, or `None` after printing
    /// "Invalid choice.".
    fn submenu(&mut self, title: &str) -> MenuResult<Option<Action>> {
        writeln!(self.output)?;
        writeln!(self.output, "{title}")?;
        writeln!(self.output, "1. Create")?;
        writeln!(self.output, "2. Read")?;
        writeln!(self.output, "3. Update")?;
        writeln!(self.output, "4. Delete")?;
        writeln!(self.output, "5. List")?;

        let action = match self.prompt("Enter choice: ")?.as_str() {
            "1" => Action::Create,
            "2" => Action::Read,
            "3" => Action::Update,
            "4" => Action::Delete,
            "5" => Action::List,
            _ => {
                writeln!(self.output, "Invalid choice.")?;
                return Ok(None);
            }
        };
        Ok(Some(action))
    }

    // ------------------------------------------------------------------------
    // Patients
    // ------------------------------------------------------------------------

    fn patients(&mut self) -> MenuResult<()> {
        let Some(action) = self.submenu("Patients")? else {
            return Ok(());
        };
        let clinic = self.clinic;
        let service = clinic.patients();

        match action {
            Action::Create => {
                let details = self.patient_details()?;
                let patient = service.create(details)?;
                writeln!(self.output, "Created {patient}")?;
            }
            Action::Read => {
                let id = PatientId::parse(&self.prompt("Patient ID: ")?)?;
                match service.read(id)? {
                    Some(record) => {
                        writeln!(self.output, "{}", record.patient)?;
                        if let Some(email) = &record.patient.details.email {
                            writeln!(self.output, "  Email: {email}")?;
                        }
                        if let Some(phone) = &record.patient.details.phone {
                            writeln!(self.output, "  Phone: {phone}")?;
                        }
                        for doctor in &record.doctors {
                            writeln!(self.output, "  {doctor}")?;
                        }
                    }
                    None => writeln!(self.output, "Patient not found.")?,
                }
            }
            Action::Update => {
                let id = PatientId::parse(&self.prompt("Patient ID: ")?)?;
                if service.get(id)?.is_none() {
                    writeln!(self.output, "Patient not found.")?;
                    return Ok(());
                }
                let details = self.patient_details()?;
                match service.update(id, details)? {
                    Some(patient) => writeln!(self.output, "Updated {patient}")?,
                    None => writeln!(self.output, "Patient not found.")?,
                }
            }
            Action::Delete => {
                let id = PatientId::parse(&self.prompt("Patient ID: ")?)?;
                match service.delete(id)? {
                    Some(_) => writeln!(self.output, "Deleted patient {id}.")?,
                    None => writeln!(self.output, "Patient not found.")?,
                }
            }
            Action::List => {
                let patients = service.list_all()?;
                if patients.is_empty() {
                    writeln!(self.output, "No patients found.")?;
                }
                for patient in patients {
                    writeln!(self.output, "{patient}")?;
                }
            }
        }
        Ok(())
    }

    fn patient_details(&mut self) -> MenuResult<PatientDetails> {
        let first_name = self.prompt("First name: ")?;
        let last_name = self.prompt("Last name: ")?;
        let mut details = PatientDetails::new(first_name, last_name)?;

        if let Some(dob) = self.prompt_optional("Date of birth (YYYY-MM-DD, optional): ")? {
            details = details.with_date_of_birth(parse_date(&dob)?);
        }
        if let Some(email) = self.prompt_email("Email (optional): ")? {
            details = details.with_email(email);
        }
        if let Some(phone) = self.prompt_optional("Phone (optional): ")? {
            details = details.with_phone(phone);
        }
        Ok(details)
    }

    // ------------------------------------------------------------------------
    // Doctors
    // ------------------------------------------------------------------------

    fn doctors(&mut self) -> MenuResult<()> {
        let Some(action) = self.submenu("Doctors")? else {
            return Ok(());
        };
        let clinic = self.clinic;
        let service = clinic.doctors();

        match action {
            Action::Create => {
                let details = self.doctor_details()?;
                let doctor = service.create(details)?;
                writeln!(self.output, "Created {doctor}")?;
            }
            Action::Read => {
                let id = DoctorId::parse(&self.prompt("Doctor ID: ")?)?;
                match service.read(id)? {
                    Some(record) => {
                        writeln!(self.output, "{}", record.doctor)?;
                        if let Some(office) = &record.office {
                            writeln!(self.output, "  {office}")?;
                        }
                        for patient in &record.patients {
                            writeln!(self.output, "  {patient}")?;
                        }
                    }
                    None => writeln!(self.output, "Doctor not found.")?,
                }
            }
            Action::Update => {
                let id = DoctorId::parse(&self.prompt("Doctor ID: ")?)?;
                if service.get(id)?.is_none() {
                    writeln!(self.output, "Doctor not found.")?;
                    return Ok(());
                }
                let details = self.doctor_details()?;
                match service.update(id, details)? {
                    Some(doctor) => writeln!(self.output, "Updated {doctor}")?,
                    None => writeln!(self.output, "Doctor not found.")?,
                }
            }
            Action::Delete => {
                let id = DoctorId::parse(&self.prompt("Doctor ID: ")?)?;
                match service.delete(id)? {
                    Some(_) => writeln!(self.output, "Deleted doctor {id}.")?,
                    None => writeln!(self.output, "Doctor not found.")?,
                }
            }
            Action::List => {
                let doctors = service.list_all()?;
                if doctors.is_empty() {
                    writeln!(self.output, "No doctors found.")?;
                }
                for doctor in doctors {
                    writeln!(self.output, "{doctor}")?;
                }
            }
        }
        Ok(())
    }

    fn doctor_details(&mut self) -> MenuResult<DoctorDetails> {
        let first_name = self.prompt("First name: ")?;
        let last_name = self.prompt("Last name: ")?;
        let mut details = DoctorDetails::new(first_name, last_name)?;

        if let Some(specialty) = self.prompt_optional("Specialty (optional): ")? {
            details = details.with_specialty(specialty);
        }
        if let Some(email) = self.prompt_email("Email (optional): ")? {
            details = details.with_email(email);
        }
        Ok(details)
    }

    // ------------------------------------------------------------------------
    // Appointments
    // ------------------------------------------------------------------------

    fn appointments(&mut self) -> MenuResult<()> {
        let Some(action) = self.submenu("Appointments")? else {
            return Ok(());
        };
        let clinic = self.clinic;
        let service = clinic.appointments();

        match action {
            Action::Create => {
                let details = self.appointment_details()?;
                let appointment = service.create(details)?;
                writeln!(self.output, "Created {appointment}")?;
            }
            Action::Read => {
                let id = AppointmentId::parse(&self.prompt("Appointment ID: ")?)?;
                match service.read(id)? {
                    Some(record) => {
                        writeln!(self.output, "{}", record.appointment)?;
                        writeln!(self.output, "  {}", record.doctor)?;
                        writeln!(self.output, "  {}", record.patient)?;
                    }
                    None => writeln!(self.output, "Appointment not found.")?,
                }
            }
            Action::Update => {
                let id = AppointmentId::parse(&self.prompt("Appointment ID: ")?)?;
                if service.get(id)?.is_none() {
                    writeln!(self.output, "Appointment not found.")?;
                    return Ok(());
                }
                let details = self.appointment_details()?;
                match service.update(Appointment { id, details })? {
                    Some(appointment) => writeln!(self.output, "Updated {appointment}")?,
                    None => writeln!(self.output, "Appointment not found.")?,
                }
            }
            Action::Delete => {
                let id = AppointmentId::parse(&self.prompt("Appointment ID: ")?)?;
                match service.delete(id)? {
                    Some(_) => writeln!(self.output, "Deleted appointment {id}.")?,
                    None => writeln!(self.output, "Appointment not found.")?,
                }
            }
            Action::List => {
                let appointments = service.list_all()?;
                if appointments.is_empty() {
                    writeln!(self.output, "No appointments found.")?;
                }
                for appointment in appointments {
                    writeln!(self.output, "{appointment}")?;
                }
            }
        }
        Ok(())
    }

    fn appointment_details(&mut self) -> MenuResult<AppointmentDetails> {
        let doctor = DoctorId::parse(&self.prompt("Doctor ID: ")?)?;
        let patient = PatientId::parse(&self.prompt("Patient ID: ")?)?;
        let date = self.prompt_date("Date (YYYY-MM-DD): ")?;
        let notes = self.prompt("Notes: ")?;
        Ok(AppointmentDetails::new(doctor, patient, date, notes))
    }

    // ------------------------------------------------------------------------
    // Offices
    // ------------------------------------------------------------------------

    fn offices(&mut self) -> MenuResult<()> {
        let Some(action) = self.submenu("Offices")? else {
            return Ok(());
        };
        let clinic = self.clinic;
        let service = clinic.offices();

        match action {
            Action::Create => {
                let details = self.office_details()?;
                let office = service.create(details)?;
                writeln!(self.output, "Created {office}")?;
            }
            Action::Read => {
                let id = OfficeId::parse(&self.prompt("Office ID: ")?)?;
                match service.read(id)? {
                    Some(record) => {
                        writeln!(self.output, "{}", record.office)?;
                        if let Some(phone) = &record.office.phone {
                            writeln!(self.output, "  Phone: {phone}")?;
                        }
                        if let Some(doctor) = &record.doctor {
                            writeln!(self.output, "  {doctor}")?;
                        }
                    }
                    None => writeln!(self.output, "Office not found.")?,
                }
            }
            Action::Update => {
                let id = OfficeId::parse(&self.prompt("Office ID: ")?)?;
                if service.get(id)?.is_none() {
                    writeln!(self.output, "Office not found.")?;
                    return Ok(());
                }
                let details = self.office_details()?;
                match service.update(id, details)? {
                    Some(office) => writeln!(self.output, "Updated {office}")?,
                    None => writeln!(self.output, "Office not found.")?,
                }
            }
            Action::Delete => {
                let id = OfficeId::parse(&self.prompt("Office ID: ")?)?;
                match service.delete(id)? {
                    Some(_) => writeln!(self.output, "Deleted office {id}.")?,
                    None => writeln!(self.output, "Office not found.")?,
                }
            }
            Action::List => {
                let offices = service.list_all()?;
                if offices.is_empty() {
                    writeln!(self.output, "No offices found.")?;
                }
                for office in offices {
                    writeln!(self.output, "{office}")?;
                }
            }
        }
        Ok(())
    }

    fn office_details(&mut self) -> MenuResult<OfficeDetails> {
        let location = self.prompt("Location: ")?;
        let phone = self.prompt_optional("Phone (optional): ")?;
        let doctor = DoctorId::parse(&self.prompt("Doctor ID: ")?)?;

        let details = OfficeDetails::new(location, doctor)?;
        Ok(match phone {
            Some(phone) => details.with_phone(phone),
            None => details,
        })
    }
}
