//! Interactive menu over a [`RentalEngine`].
//!
//! The shell owns prompting, parsing and printing; every state change goes
//! through the engine. Input and output are generic so sessions can be
//! scripted in tests.

use crate::app::report;
use crate::core::{Customer, Persistence, RentalEngine, Vehicle};
use crate::utils::error::{RentalError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::io::{BufRead, Write};
use std::str::FromStr;

const MENU: &str = "
1: Add Vehicle
2: Add Customer
3: Rent Vehicle
4: Return Vehicle
5: Display Available Vehicles
6: Show Rental History
7: Search History by Customer
8: Search History by Plate
9: Exit";

const MIN_YEAR: i32 = 1886;
const MAX_YEAR: i32 = 2100;

enum Flow {
    Continue,
    Exit,
}

/// Unwrap a prompt answer, leaving the menu loop on end of input.
macro_rules! answer {
    ($prompt:expr) => {
        match $prompt? {
            Some(value) => value,
            None => return Ok(Flow::Exit),
        }
    };
}

pub struct Shell<'a, P: Persistence, R: BufRead, W: Write> {
    engine: &'a RentalEngine<P>,
    input: R,
    output: W,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl<'a, P: Persistence, R: BufRead, W: Write> Shell<'a, P, R, W> {
    pub fn new(engine: &'a RentalEngine<P>, input: R, output: W) -> Self {
        Self {
            engine,
            input,
            output,
            today: local_today,
        }
    }

    /// Override the date stamped on rent and return records.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until the user picks Exit or input ends.
    pub fn run(&mut self) -> Result<()> {
        loop {
            writeln!(self.output, "{}", MENU)?;
            writeln!(self.output, "Enter a number from the above menu--> ")?;
            let Some(choice) = self.read_line()? else {
                break;
            };

            let flow = match choice.as_str() {
                "1" => self.add_vehicle()?,
                "2" => self.add_customer()?,
                "3" => self.rent()?,
                "4" => self.return_vehicle()?,
                "5" => self.show_available()?,
                "6" => self.show_history()?,
                "7" => self.search_by_customer()?,
                "8" => self.search_by_plate()?,
                "9" => Flow::Exit,
                _ => {
                    writeln!(self.output, "Invalid choice. Try again.")?;
                    Flow::Continue
                }
            };
            if let Flow::Exit = flow {
                break;
            }
        }
        self.output.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;
        self.read_line()
    }

    /// `Ok(Some(Err(..)))` carries a parse failure the caller reports.
    fn prompt_parse<T: FromStr>(
        &mut self,
        label: &str,
    ) -> Result<Option<std::result::Result<T, String>>> {
        Ok(self.prompt(label)?.map(|raw| raw.parse::<T>().map_err(|_| raw)))
    }

    /// Print a user-facing error; only I/O on the terminal itself is fatal.
    fn report(&mut self, err: RentalError) -> Result<Flow> {
        tracing::debug!("Shell action failed: {}", err);
        writeln!(self.output, "Error: {}", err.user_friendly_message())?;
        Ok(Flow::Continue)
    }

    fn invalid(&mut self, what: &str, raw: &str) -> Result<Flow> {
        writeln!(self.output, "Invalid {}: '{}'", what, raw)?;
        Ok(Flow::Continue)
    }

    fn add_vehicle(&mut self) -> Result<Flow> {
        let kind = answer!(self.prompt("  1: Car\n  2: Motorcycle\n  3: Truck\n--> "));
        if !matches!(kind.as_str(), "1" | "2" | "3") {
            writeln!(self.output, "Vehicle not added.")?;
            return Ok(Flow::Continue);
        }

        let plate = answer!(self.prompt("Enter license plate: "));
        let make = answer!(self.prompt("Enter make: "));
        let model = answer!(self.prompt("Enter model: "));
        let year = match answer!(self.prompt_parse::<i32>("Enter year: ")) {
            Ok(year) => year,
            Err(raw) => return self.invalid("year", &raw),
        };
        if let Err(e) = validate_non_empty_string("make", &make)
            .and_then(|_| validate_non_empty_string("model", &model))
            .and_then(|_| validate_range("year", year, MIN_YEAR, MAX_YEAR))
        {
            return self.report(e);
        }

        let vehicle = match kind.as_str() {
            "1" => match answer!(self.prompt_parse::<u8>("Enter number of seats: ")) {
                Ok(seats) if seats > 0 => Vehicle::car(&make, &model, year, seats),
                Ok(seats) => return self.invalid("number of seats", &seats.to_string()),
                Err(raw) => return self.invalid("number of seats", &raw),
            },
            "2" => {
                let raw = answer!(self.prompt("Has sidecar? (true/false): "));
                match parse_yes_no(&raw) {
                    Some(sidecar) => Vehicle::motorcycle(&make, &model, year, sidecar),
                    None => return self.invalid("answer", &raw),
                }
            }
            _ => match answer!(self.prompt_parse::<f64>("Enter the cargo capacity: ")) {
                Ok(capacity) if capacity.is_finite() && capacity > 0.0 => {
                    Vehicle::truck(&make, &model, year, capacity)
                }
                Ok(capacity) => return self.invalid("cargo capacity", &capacity.to_string()),
                Err(raw) => return self.invalid("cargo capacity", &raw),
            },
        };

        let vehicle = match vehicle.with_plate(&plate) {
            Ok(vehicle) => vehicle,
            Err(e) => return self.report(e),
        };
        match self.engine.add_vehicle(vehicle) {
            Ok(true) => writeln!(self.output, "Vehicle added.")?,
            Ok(false) => writeln!(
                self.output,
                "Vehicle with plate {} already exists.",
                plate.trim().to_ascii_uppercase()
            )?,
            Err(e) => return self.report(e),
        }
        Ok(Flow::Continue)
    }

    fn add_customer(&mut self) -> Result<Flow> {
        let id = match answer!(self.prompt_parse::<i32>("Enter customer ID: ")) {
            Ok(id) => id,
            Err(raw) => return self.invalid("customer ID", &raw),
        };
        let name = answer!(self.prompt("Enter name: "));
        if let Err(e) = validate_non_empty_string("name", &name) {
            return self.report(e);
        }

        match self.engine.add_customer(Customer::new(id, &name)) {
            Ok(true) => writeln!(self.output, "Customer added.")?,
            Ok(false) => writeln!(self.output, "Customer with ID {} already exists.", id)?,
            Err(e) => return self.report(e),
        }
        Ok(Flow::Continue)
    }

    fn rent(&mut self) -> Result<Flow> {
        let vehicles = {
            let store = self.engine.store();
            report::vehicle_table(store.available_vehicles())
        };
        writeln!(self.output, "List of Available Vehicles:\n{}", vehicles)?;
        self.transition(true, "Enter rental amount: ")
    }

    fn return_vehicle(&mut self) -> Result<Flow> {
        let vehicles = {
            let store = self.engine.store();
            report::vehicle_table(store.vehicles())
        };
        writeln!(self.output, "List of Vehicles:\n{}", vehicles)?;
        self.transition(false, "Enter return fees: ")
    }

    fn transition(&mut self, renting: bool, amount_label: &str) -> Result<Flow> {
        let plate = answer!(self.prompt("Enter license plate: "));

        let customers = report::customer_list(self.engine.store().customers());
        writeln!(self.output, "Registered Customers:\n{}", customers)?;
        let customer_id = match answer!(self.prompt_parse::<i32>("Enter customer ID: ")) {
            Ok(id) => id,
            Err(raw) => return self.invalid("customer ID", &raw),
        };
        let amount = match answer!(self.prompt_parse::<Decimal>(amount_label)) {
            Ok(amount) => amount,
            Err(raw) => return self.invalid("amount", &raw),
        };

        let (plate, customer_name) = {
            let store = self.engine.store();
            match (
                store.find_vehicle_by_plate(&plate),
                store.find_customer_by_id(customer_id),
            ) {
                (Some(vehicle), Some(customer)) => (
                    vehicle.license_plate().unwrap_or_default().to_string(),
                    customer.name().to_string(),
                ),
                _ => {
                    writeln!(self.output, "Vehicle or customer not found.")?;
                    return Ok(Flow::Continue);
                }
            }
        };

        let today = (self.today)();
        let result = if renting {
            self.engine.rent(&plate, customer_id, today, amount)
        } else {
            self.engine.return_vehicle(&plate, customer_id, today, amount)
        };

        match result {
            Ok(true) if renting => writeln!(
                self.output,
                "Vehicle {} rented to {}.",
                plate, customer_name
            )?,
            Ok(true) => writeln!(
                self.output,
                "Vehicle {} returned by {}.",
                plate, customer_name
            )?,
            Ok(false) => {
                let status = self
                    .engine
                    .store()
                    .find_vehicle_by_plate(&plate)
                    .map(|vehicle| vehicle.status().to_string())
                    .unwrap_or_default();
                let action = if renting { "rented" } else { "returned" };
                writeln!(
                    self.output,
                    "Vehicle {} cannot be {} (status {}).",
                    plate, action, status
                )?
            }
            Err(e) => return self.report(e),
        }
        Ok(Flow::Continue)
    }

    fn show_available(&mut self) -> Result<Flow> {
        let table = report::vehicle_table(self.engine.store().available_vehicles());
        writeln!(self.output, "{}", table)?;
        Ok(Flow::Continue)
    }

    fn show_history(&mut self) -> Result<Flow> {
        let history = report::history(self.engine.store().records());
        writeln!(self.output, "Rental History:\n{}", history)?;
        Ok(Flow::Continue)
    }

    fn search_by_customer(&mut self) -> Result<Flow> {
        let name = answer!(self.prompt("Enter customer name: "));
        let history = report::history(self.engine.store().records_by_customer(&name));
        writeln!(self.output, "{}", history)?;
        Ok(Flow::Continue)
    }

    fn search_by_plate(&mut self) -> Result<Flow> {
        let plate = answer!(self.prompt("Enter license plate: "));
        let history = report::history(self.engine.store().records_by_vehicle(&plate));
        writeln!(self.output, "{}", history)?;
        Ok(Flow::Continue)
    }
}

fn parse_yes_no(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" => Some(true),
        "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
