//! # Rental Lifecycle Manager
//!
//! Creates, prices, checks out and cancels rentals, and manages their drink
//! lines and additional cars.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   create ──► ACTIVE ──checkout──► COMPLETED (payment pending|completed) │
//! │                │                        │                               │
//! │                │                        └─settle_payment─► completed    │
//! │                └──cancel──► CANCELLED                                   │
//! │                                                                         │
//! │   room:   available → occupied (create)                                 │
//! │           occupied  → cleaning (checkout)                               │
//! │           occupied  → available (cancel)                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Checkout Pricing
//! The stay is priced by [`calculate_charge`]. If the result carries an
//! escalation the rental's rent type is overwritten and the old one kept in
//! `previous_rent_type`; a warning is stored on the rental. The ledger hears
//! about the checkout only once payment covers the bill.

use chrono::{Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::{
    new_id, CustomerRepository, DrinkRepository, PriceLogicRepository, RentalRepository,
    RoomRepository,
};
use crate::service::shift::{close_checkin, record_checkin, record_checkout, CheckoutEvent};
use innkeep_core::bill::{compose_charges, drinks_total, settle, settle_further};
use innkeep_core::pricing::{
    calculate_charge, estimate_calculation, ChargeRequest, ChargeResult, ChargeWarning, Estimate,
};
use innkeep_core::stock::{aggregate_orders, DrinkOrder};
use innkeep_core::validation::{
    validate_amount, validate_car_number, validate_id, validate_note, validate_number_of_guests,
    validate_quantity, validate_range,
};
use innkeep_core::{
    CarStatus, Charges, CoreError, Customer, Drink, Money, PaymentMethod, PaymentRecord,
    PaymentStatus, RentType, Rental, RentalAdditionalCar, RentalDetails, RentalDrink,
    RentalStatus, Room, RoomStatus, User, ValidationError, MAX_QUANTITY,
};

// =============================================================================
// Requests
// =============================================================================

/// Who is checking in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRef {
    #[serde(default)]
    pub is_walk_in: bool,
    pub car_number: Option<String>,
    /// Existing customer; takes precedence over `car_number`.
    pub customer_id: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRental {
    pub room_id: String,
    pub rent_type: RentType,
    /// Defaults to now (local wall clock).
    pub check_in_time: Option<NaiveDateTime>,
    pub number_of_guests: i64,
    pub main_customer: CustomerRef,
    #[serde(default)]
    pub drinks: Vec<DrinkOrder>,
    pub note: Option<String>,
}

/// Inputs of a read-only checkout preview.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPreview {
    pub rental_id: String,
    pub checkout_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub additional_charges: Money,
    #[serde(default)]
    pub discount: Money,
    pub customer_payment: Option<Money>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub rental_id: String,
    #[serde(default)]
    pub additional_charges: Money,
    #[serde(default)]
    pub discount: Money,
    pub note: Option<String>,
    pub payment_method: PaymentMethod,
    pub customer_payment: Money,
    pub checkout_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdditionalCar {
    #[serde(default)]
    pub is_walk_in: bool,
    pub car_number: Option<String>,
    pub number_of_guests: Option<i64>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// Priced checkout, nothing persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutBreakdown {
    pub rental_id: String,
    pub room_number: String,
    pub check_in_time: NaiveDateTime,
    pub check_out_time: NaiveDateTime,
    pub charge: ChargeResult,
    pub drinks: Vec<RentalDrink>,
    pub charges: Charges,
    pub payment: Option<PaymentRecord>,
}

/// A stay priced against a checkout time.
struct PricedStay {
    room: Room,
    check_out: NaiveDateTime,
    charge: ChargeResult,
    drinks: Vec<RentalDrink>,
    charges: Charges,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn ensure_active(rental: &Rental) -> DbResult<()> {
    if rental.is_active() {
        Ok(())
    } else {
        Err(CoreError::InvalidRentalStatus {
            rental_id: rental.id.clone(),
            current_status: rental.status.as_str().to_string(),
        }
        .into())
    }
}

async fn require_room(conn: &mut SqliteConnection, id: &str) -> DbResult<Room> {
    RoomRepository::find(conn, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Room", id).into())
}

async fn require_sellable(conn: &mut SqliteConnection, drink_id: &str) -> DbResult<Drink> {
    let drink = DrinkRepository::find(conn, drink_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Drink", drink_id))?;
    if !drink.is_active {
        return Err(CoreError::DrinkUnavailable { name: drink.name }.into());
    }
    Ok(drink)
}

async fn active_rental(conn: &mut SqliteConnection, id: &str) -> DbResult<Rental> {
    let rental = RentalRepository::require(conn, id).await?;
    ensure_active(&rental)?;
    Ok(rental)
}

/// Prices `rental` as if checked out at `checkout_time`.
async fn price_stay(
    conn: &mut SqliteConnection,
    rental: &Rental,
    checkout_time: Option<NaiveDateTime>,
    additional_charges: Money,
    discount: Money,
) -> DbResult<PricedStay> {
    let room = require_room(&mut *conn, &rental.room_id).await?;
    let logic = PriceLogicRepository::current(&mut *conn).await?;
    let check_out = checkout_time.unwrap_or_else(local_now);

    let charge = calculate_charge(
        &logic,
        &ChargeRequest {
            check_in: rental.check_in_time,
            check_out,
            rent_type: rental.rent_type,
            room_type_id: &room.room_type_id,
            has_prior_warning: rental.has_warning,
        },
    )?;

    let drinks = RentalRepository::drinks(conn, &rental.id).await?;
    let charges = compose_charges(charge.amount, drinks_total(&drinks), discount, additional_charges)?;

    Ok(PricedStay {
        room,
        check_out,
        charge,
        drinks,
        charges,
    })
}

// =============================================================================
// Service
// =============================================================================

#[derive(Debug, Clone)]
pub struct RentalService {
    pool: SqlitePool,
}

impl RentalService {
    pub fn new(pool: SqlitePool) -> Self {
        RentalService { pool }
    }

    // -------------------------------------------------------------------------
    // Create
    // -------------------------------------------------------------------------

    /// Checks a guest into a room.
    ///
    /// ## What This Does
    /// 1. Validates input, resolves (or creates) the customer
    /// 2. Checks every requested drink is sellable and in stock
    /// 3. Flips the room to occupied with a guarded update
    /// 4. Inserts the rental and drink lines, takes the stock
    /// 5. Files the check-in under the caller's shift
    ///
    /// Any failure leaves the database untouched.
    pub async fn create(&self, user: &User, req: CreateRental) -> DbResult<RentalDetails> {
        validate_id("roomId", &req.room_id)?;
        validate_number_of_guests(req.number_of_guests)?;
        let note = validate_note(req.note.as_deref())?;
        let orders = aggregate_orders(&req.drinks)?;

        let mut tx = self.pool.begin().await?;

        let room = require_room(&mut tx, &req.room_id).await?;
        if !room.can_accept_rental() {
            return Err(CoreError::RoomUnavailable {
                room_number: room.number,
                status: room.status.as_str().to_string(),
            }
            .into());
        }

        // prices are needed at checkout; refuse stays that could never be billed
        PriceLogicRepository::current(&mut tx).await?.room_price(&room.room_type_id)?;

        let customer = resolve_main_customer(&mut tx, &req.main_customer).await?;

        let mut stocked = Vec::with_capacity(orders.len());
        for order in &orders {
            let drink = require_sellable(&mut tx, &order.drink_id).await?;
            if drink.total_units() < order.quantity {
                return Err(CoreError::InsufficientStock {
                    drink: drink.name.clone(),
                    available: drink.total_units(),
                    requested: order.quantity,
                }
                .into());
            }
            stocked.push((drink, order.quantity));
        }

        if !RoomRepository::occupy(&mut tx, &room.id).await? {
            return Err(CoreError::RoomUnavailable {
                room_number: room.number,
                status: RoomStatus::Occupied.as_str().to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let rental = Rental {
            id: new_id(),
            room_id: room.id.clone(),
            customer_id: customer.id.clone(),
            user_id: user.id.clone(),
            car_number: customer.car_number.clone(),
            number_of_guests: req.number_of_guests,
            check_in_time: req.check_in_time.unwrap_or_else(local_now),
            check_out_time: None,
            status: RentalStatus::Active,
            rent_type: req.rent_type,
            previous_rent_type: None,
            has_warning: false,
            warning_details: None,
            charges: None,
            duration: None,
            payment: None,
            payment_method: None,
            payment_status: PaymentStatus::Pending,
            total_amount: Money::zero(),
            note,
            created_at: now,
            updated_at: now,
        };

        RentalRepository::insert(&mut tx, &rental)
            .await
            .map_err(|e| {
                if e.is_unique_violation_on("rentals") {
                    DbError::Domain(CoreError::RoomUnavailable {
                        room_number: room.number.clone(),
                        status: RoomStatus::Occupied.as_str().to_string(),
                    })
                } else {
                    e
                }
            })?;

        for (drink, quantity) in &stocked {
            let line = RentalDrink {
                id: new_id(),
                rental_id: rental.id.clone(),
                drink_id: drink.id.clone(),
                name: drink.name.clone(),
                quantity: *quantity,
                unit_price: drink.selling_price,
            };
            RentalRepository::insert_drink_line(&mut tx, &line).await?;
            DrinkRepository::take_units(&mut tx, drink, *quantity).await?;
        }

        record_checkin(&mut tx, &rental, &room, user).await?;

        tx.commit().await?;

        info!(
            rental_id = %rental.id,
            room = %room.number,
            rent_type = %rental.rent_type,
            car_number = %rental.car_number,
            "Rental created"
        );

        self.get(&rental.id).await
    }

    // -------------------------------------------------------------------------
    // Pricing
    // -------------------------------------------------------------------------

    /// Quotes a rent type for a room type, starting now.
    pub async fn estimate(&self, rent_type: RentType, room_type_id: &str) -> DbResult<Estimate> {
        let mut conn = self.pool.acquire().await?;
        let logic = PriceLogicRepository::current(&mut conn).await?;
        Ok(estimate_calculation(&logic, rent_type, room_type_id, local_now())?)
    }

    /// Prices a checkout without persisting anything.
    pub async fn calculate_checkout(&self, req: CheckoutPreview) -> DbResult<CheckoutBreakdown> {
        let mut conn = self.pool.acquire().await?;

        let rental = active_rental(&mut conn, &req.rental_id).await?;
        let priced = price_stay(
            &mut conn,
            &rental,
            req.checkout_time,
            req.additional_charges,
            req.discount,
        )
        .await?;

        let payment = req
            .customer_payment
            .map(|tendered| {
                settle(
                    priced.charges.final_amount,
                    tendered,
                    req.payment_method.unwrap_or(PaymentMethod::Cash),
                )
            })
            .transpose()?;

        Ok(CheckoutBreakdown {
            rental_id: rental.id,
            room_number: priced.room.number,
            check_in_time: rental.check_in_time,
            check_out_time: priced.check_out,
            charge: priced.charge,
            drinks: priced.drinks,
            charges: priced.charges,
            payment,
        })
    }

    /// Checks a rental out: bill, payment, room to cleaning, ledger.
    pub async fn checkout(&self, user: &User, req: CheckoutRequest) -> DbResult<RentalDetails> {
        let note = validate_note(req.note.as_deref())?;
        validate_amount("customerPayment", req.customer_payment)?;

        let mut tx = self.pool.begin().await?;

        let mut rental = active_rental(&mut tx, &req.rental_id).await?;
        let priced = price_stay(
            &mut tx,
            &rental,
            req.checkout_time,
            req.additional_charges,
            req.discount,
        )
        .await?;

        let payment = settle(priced.charges.final_amount, req.customer_payment, req.payment_method)?;

        if let Some(changed_to) = priced.charge.escalated_to() {
            info!(rental_id = %rental.id, from = %rental.rent_type, to = %changed_to, "Rent type escalated");
            rental.previous_rent_type = Some(rental.rent_type);
            rental.rent_type = changed_to;
        }
        if let Some(warning) = priced.charge.warning.clone() {
            rental.has_warning = true;
            rental.warning_details = Some(warning);
        }

        rental.check_out_time = Some(priced.check_out);
        rental.status = RentalStatus::Completed;
        rental.duration = Some(priced.charge.duration);
        rental.charges = Some(priced.charges.clone());
        rental.total_amount = priced.charges.final_amount;
        rental.payment_method = Some(payment.method);
        rental.payment_status = payment.status;
        rental.payment = Some(payment.clone());
        if note.is_some() {
            rental.note = note;
        }

        RentalRepository::save(&mut tx, &mut rental).await?;

        if !RoomRepository::transition(&mut tx, &priced.room.id, RoomStatus::Occupied, RoomStatus::Cleaning)
            .await?
        {
            warn!(room = %priced.room.number, status = priced.room.status.as_str(), "Checked-out room was not occupied");
        }

        CustomerRepository::record_visit(&mut tx, &rental.customer_id, rental.total_amount, priced.check_out)
            .await?;

        let cars = RentalRepository::cars(&mut tx, &rental.id).await?;
        for car in cars.iter().filter(|c| !c.is_walk_in) {
            if let Some(related) = car.customer_id.as_deref() {
                if related != rental.customer_id {
                    CustomerRepository::bump_relation(&mut tx, &rental.customer_id, related, priced.check_out)
                        .await?;
                }
            }
        }
        RentalRepository::mark_cars_left(&mut tx, &rental.id).await?;

        if payment.status == PaymentStatus::Completed {
            let event = checkout_event(&rental, &priced.room, &payment, user);
            record_checkout(&mut tx, &event).await?;
        }

        tx.commit().await?;

        info!(
            rental_id = %rental.id,
            room = %priced.room.number,
            total = rental.total_amount.amount(),
            payment_status = ?rental.payment_status,
            "Checkout completed"
        );

        self.get(&rental.id).await
    }

    /// Takes a further payment on a checked-out rental that was underpaid.
    pub async fn settle_payment(
        &self,
        user: &User,
        rental_id: &str,
        customer_payment: Money,
        method: PaymentMethod,
    ) -> DbResult<RentalDetails> {
        let mut tx = self.pool.begin().await?;

        let mut rental = RentalRepository::require(&mut tx, rental_id).await?;
        if !rental.awaits_payment() {
            return Err(CoreError::InvalidRentalStatus {
                rental_id: rental.id,
                current_status: match rental.status {
                    RentalStatus::Completed => "already paid".to_string(),
                    other => other.as_str().to_string(),
                },
            }
            .into());
        }

        let payment = settle_further(rental.payment.as_ref(), rental.total_amount, customer_payment, method)?;
        rental.payment_method = Some(payment.method);
        rental.payment_status = payment.status;
        rental.payment = Some(payment.clone());

        RentalRepository::save(&mut tx, &mut rental).await?;

        if payment.status == PaymentStatus::Completed {
            let room = require_room(&mut tx, &rental.room_id).await?;
            let event = checkout_event(&rental, &room, &payment, user);
            record_checkout(&mut tx, &event).await?;
        }

        tx.commit().await?;

        info!(
            rental_id = %rental.id,
            paid = payment.amount.amount(),
            payment_status = ?payment.status,
            "Payment settled"
        );

        self.get(&rental.id).await
    }

    /// Prices the stay as of `at` and stores any upsell warning on the rental.
    ///
    /// A stored warning lets an overflowing half-day stay be re-priced as
    /// overnight at checkout.
    pub async fn flag_warning(
        &self,
        rental_id: &str,
        at: Option<NaiveDateTime>,
    ) -> DbResult<Option<ChargeWarning>> {
        let mut tx = self.pool.begin().await?;

        let mut rental = active_rental(&mut tx, rental_id).await?;
        let priced = price_stay(&mut tx, &rental, at, Money::zero(), Money::zero()).await?;

        let Some(warning) = priced.charge.warning else {
            return Ok(rental.warning_details);
        };

        if rental.warning_details.as_ref() != Some(&warning) {
            debug!(rental_id = %rental.id, suggested = %warning.suggested_type, "Recording rental warning");
            rental.has_warning = true;
            rental.warning_details = Some(warning.clone());
            RentalRepository::save(&mut tx, &mut rental).await?;
            tx.commit().await?;
        }

        Ok(Some(warning))
    }

    /// Cancels an active rental: drinks back to stock, room free again.
    pub async fn cancel(&self, rental_id: &str, note: Option<&str>) -> DbResult<RentalDetails> {
        let note = validate_note(note)?;

        let mut tx = self.pool.begin().await?;

        let mut rental = active_rental(&mut tx, rental_id).await?;

        for line in RentalRepository::drinks(&mut tx, &rental.id).await? {
            DrinkRepository::return_units(&mut tx, &line.drink_id, line.quantity).await?;
        }

        if !RoomRepository::transition(&mut tx, &rental.room_id, RoomStatus::Occupied, RoomStatus::Available)
            .await?
        {
            warn!(rental_id = %rental.id, "Cancelled rental's room was not occupied");
        }

        close_checkin(&mut tx, &rental.id).await?;
        RentalRepository::mark_cars_left(&mut tx, &rental.id).await?;

        rental.status = RentalStatus::Cancelled;
        if note.is_some() {
            rental.note = note;
        }
        RentalRepository::save(&mut tx, &mut rental).await?;

        tx.commit().await?;

        info!(rental_id = %rental.id, "Rental cancelled");
        self.get(&rental.id).await
    }

    // -------------------------------------------------------------------------
    // Additional cars
    // -------------------------------------------------------------------------

    /// Attaches another vehicle (and its guests) to an active rental.
    pub async fn add_additional_car(
        &self,
        rental_id: &str,
        req: NewAdditionalCar,
    ) -> DbResult<RentalDetails> {
        let number_of_guests = req.number_of_guests.unwrap_or(1);
        validate_number_of_guests(number_of_guests)?;

        let mut tx = self.pool.begin().await?;

        let rental = active_rental(&mut tx, rental_id).await?;

        let car = if req.is_walk_in {
            let walk_in = CustomerRepository::create_walk_in(&mut tx).await?;
            RentalAdditionalCar {
                id: new_id(),
                rental_id: rental.id.clone(),
                car_number: walk_in.car_number,
                customer_id: Some(walk_in.id),
                is_walk_in: true,
                number_of_guests,
                status: CarStatus::Active,
            }
        } else {
            let plate = validate_car_number(required(req.car_number.as_deref(), "carNumber")?)?;
            if RentalRepository::plate_on_rental(&mut tx, &rental.id, &plate).await? {
                return Err(CoreError::DuplicateCarOnRental { car_number: plate }.into());
            }

            let customer = CustomerRepository::find_or_create(
                &mut tx,
                &plate,
                req.full_name.as_deref(),
                req.phone.as_deref(),
            )
            .await?;
            if CustomerRepository::has_active_rental(&mut tx, &customer.id, Some(&rental.id)).await? {
                return Err(CoreError::CustomerHasActiveRental { car_number: plate }.into());
            }

            RentalAdditionalCar {
                id: new_id(),
                rental_id: rental.id.clone(),
                car_number: plate,
                customer_id: Some(customer.id),
                is_walk_in: false,
                number_of_guests,
                status: CarStatus::Active,
            }
        };

        RentalRepository::insert_car(&mut tx, &car).await?;
        tx.commit().await?;

        info!(rental_id = %rental.id, car_number = %car.car_number, "Additional car added");
        self.get(&rental.id).await
    }

    /// Marks an additional car as left.
    pub async fn remove_additional_car(&self, rental_id: &str, car_id: &str) -> DbResult<RentalDetails> {
        let mut tx = self.pool.begin().await?;

        let rental = active_rental(&mut tx, rental_id).await?;
        let car = RentalRepository::find_car(&mut tx, car_id)
            .await?
            .filter(|c| c.rental_id == rental.id && c.status == CarStatus::Active)
            .ok_or_else(|| CoreError::not_found("Additional car", car_id))?;

        RentalRepository::set_car_status(&mut tx, &car.id, CarStatus::Left).await?;
        tx.commit().await?;

        debug!(rental_id = %rental.id, car_number = %car.car_number, "Additional car left");
        self.get(&rental.id).await
    }

    // -------------------------------------------------------------------------
    // Drinks
    // -------------------------------------------------------------------------

    /// Adds drinks to an active rental, merging into existing lines.
    ///
    /// Existing lines keep their original unit price.
    pub async fn add_drinks(&self, rental_id: &str, orders: &[DrinkOrder]) -> DbResult<RentalDetails> {
        let orders = aggregate_orders(orders)?;
        if orders.is_empty() {
            return Err(ValidationError::Required {
                field: "drinks".to_string(),
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;

        let rental = active_rental(&mut tx, rental_id).await?;

        for order in &orders {
            let drink = require_sellable(&mut tx, &order.drink_id).await?;
            DrinkRepository::take_units(&mut tx, &drink, order.quantity).await?;

            match RentalRepository::find_drink_line(&mut tx, &rental.id, &drink.id).await? {
                Some(line) => {
                    let quantity = line.quantity + order.quantity;
                    validate_quantity(quantity)?;
                    RentalRepository::set_drink_quantity(&mut tx, &line.id, quantity).await?;
                }
                None => {
                    let line = RentalDrink {
                        id: new_id(),
                        rental_id: rental.id.clone(),
                        drink_id: drink.id.clone(),
                        name: drink.name.clone(),
                        quantity: order.quantity,
                        unit_price: drink.selling_price,
                    };
                    RentalRepository::insert_drink_line(&mut tx, &line).await?;
                }
            }
        }

        tx.commit().await?;

        debug!(rental_id = %rental.id, lines = orders.len(), "Drinks added");
        self.get(&rental.id).await
    }

    /// Changes a drink line by `change` units; reaching zero removes it.
    pub async fn update_drink_quantity(
        &self,
        rental_id: &str,
        drink_id: &str,
        change: i64,
    ) -> DbResult<RentalDetails> {
        if change == 0 {
            return Err(ValidationError::MustBePositive {
                field: "change".to_string(),
            }
            .into());
        }
        validate_range("change", change, -MAX_QUANTITY, MAX_QUANTITY)?;

        let mut tx = self.pool.begin().await?;

        let rental = active_rental(&mut tx, rental_id).await?;
        let line = RentalRepository::find_drink_line(&mut tx, &rental.id, drink_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Drink line", drink_id))?;

        let quantity = line.quantity + change;

        if change > 0 {
            validate_quantity(quantity)?;
            let drink = require_sellable(&mut tx, drink_id).await?;
            DrinkRepository::take_units(&mut tx, &drink, change).await?;
            RentalRepository::set_drink_quantity(&mut tx, &line.id, quantity).await?;
        } else if quantity > 0 {
            DrinkRepository::return_units(&mut tx, drink_id, -change).await?;
            RentalRepository::set_drink_quantity(&mut tx, &line.id, quantity).await?;
        } else {
            DrinkRepository::return_units(&mut tx, drink_id, line.quantity).await?;
            RentalRepository::delete_drink_line(&mut tx, &line.id).await?;
        }

        tx.commit().await?;

        debug!(rental_id = %rental.id, drink_id, change, "Drink quantity changed");
        self.get(&rental.id).await
    }

    /// Removes a drink line, returning its units to stock.
    pub async fn delete_drink(&self, rental_id: &str, drink_id: &str) -> DbResult<RentalDetails> {
        let mut tx = self.pool.begin().await?;

        let rental = active_rental(&mut tx, rental_id).await?;
        let line = RentalRepository::find_drink_line(&mut tx, &rental.id, drink_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Drink line", drink_id))?;

        DrinkRepository::return_units(&mut tx, drink_id, line.quantity).await?;
        RentalRepository::delete_drink_line(&mut tx, &line.id).await?;

        tx.commit().await?;

        debug!(rental_id = %rental.id, drink_id, "Drink line removed");
        self.get(&rental.id).await
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub async fn get(&self, rental_id: &str) -> DbResult<RentalDetails> {
        RentalRepository::new(self.pool.clone()).get(rental_id).await
    }

    pub async fn list_active(&self) -> DbResult<Vec<RentalDetails>> {
        RentalRepository::new(self.pool.clone()).list_active().await
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> DbResult<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| {
            ValidationError::Required {
                field: field.to_string(),
            }
            .into()
        })
}

/// Finds or creates the main customer and checks they are free.
async fn resolve_main_customer(conn: &mut SqliteConnection, who: &CustomerRef) -> DbResult<Customer> {
    if who.is_walk_in {
        return CustomerRepository::create_walk_in(conn).await;
    }

    let customer = match who.customer_id.as_deref() {
        Some(id) => CustomerRepository::find(&mut *conn, id)
            .await?
            .ok_or_else(|| CoreError::not_found("Customer", id))?,
        None => {
            let plate = validate_car_number(required(who.car_number.as_deref(), "carNumber")?)?;
            CustomerRepository::find_or_create(
                &mut *conn,
                &plate,
                who.full_name.as_deref(),
                who.phone.as_deref(),
            )
            .await?
        }
    };

    if CustomerRepository::has_active_rental(conn, &customer.id, None).await? {
        return Err(CoreError::CustomerHasActiveRental {
            car_number: customer.car_number,
        }
        .into());
    }

    Ok(customer)
}

fn checkout_event(rental: &Rental, room: &Room, payment: &PaymentRecord, user: &User) -> CheckoutEvent {
    CheckoutEvent {
        rental_id: rental.id.clone(),
        room_number: room.number.clone(),
        room_type_id: room.room_type_id.clone(),
        rent_type: rental.rent_type,
        number_of_guests: rental.number_of_guests,
        check_in_time: rental.check_in_time,
        check_out_time: rental.check_out_time.unwrap_or(rental.check_in_time),
        amount: rental.total_amount,
        customer_payment: payment.amount,
        change: payment.change,
        method: payment.method,
        user_id: user.id.clone(),
        username: user.username.clone(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::ShiftRepository;
    use crate::service::fixtures::*;
    use innkeep_core::{RentalStatus, TransactionStatus, TransactionType};

    #[tokio::test]
    async fn test_create_occupies_room_and_takes_stock() {
        let m = motel().await;
        m.db.shifts().start(&m.lan, None).await.unwrap();

        let mut req = hourly_stay(&m.room, "51F-11111", at(10, 0));
        req.drinks = vec![
            DrinkOrder { drink_id: m.beer.id.clone(), quantity: 2 },
            DrinkOrder { drink_id: m.beer.id.clone(), quantity: 1 },
        ];
        let rental = m.db.rentals().create(&m.lan, req).await.unwrap();

        assert_eq!(rental.rental.status, RentalStatus::Active);
        assert_eq!(rental.room_number, "101");
        assert_eq!(rental.drinks.len(), 1);
        assert_eq!(rental.drinks[0].quantity, 3);
        assert_eq!(rental.drinks[0].unit_price, Money::new(25_000));

        let room = m.db.rooms().get(&m.room.id).await.unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::Occupied);
        let beer = m.db.drinks().get(&m.beer.id).await.unwrap().unwrap();
        assert_eq!(beer.total_units(), 7);
    }

    #[tokio::test]
    async fn test_room_cannot_be_double_booked() {
        let m = motel().await;
        m.db.rentals()
            .create(&m.lan, hourly_stay(&m.room, "51F-11111", at(10, 0)))
            .await
            .unwrap();

        let err = m
            .db
            .rentals()
            .create(&m.lan, hourly_stay(&m.room, "51F-22222", at(10, 5)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::RoomUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_unknown_room_is_not_found() {
        let m = motel().await;
        let mut req = hourly_stay(&m.room, "51F-11111", at(10, 0));
        req.room_id = new_id();
        let err = m.db.rentals().create(&m.lan, req).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_customer_with_active_rental_rejected() {
        let m = motel().await;
        m.db.rentals()
            .create(&m.lan, hourly_stay(&m.room, "51F-11111", at(10, 0)))
            .await
            .unwrap();

        let err = m
            .db
            .rentals()
            .create(&m.lan, hourly_stay(&m.other_room, "51F-11111", at(10, 30)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::CustomerHasActiveRental { .. })));

        // room 102 untouched
        let room = m.db.rooms().get(&m.other_room.id).await.unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::Available);
    }

    #[tokio::test]
    async fn test_walk_ins_never_conflict() {
        let m = motel().await;
        let mut first = hourly_stay(&m.room, "", at(10, 0));
        first.main_customer = CustomerRef { is_walk_in: true, ..CustomerRef::default() };
        let mut second = hourly_stay(&m.other_room, "", at(10, 0));
        second.main_customer = CustomerRef { is_walk_in: true, ..CustomerRef::default() };

        let a = m.db.rentals().create(&m.lan, first).await.unwrap();
        let b = m.db.rentals().create(&m.lan, second).await.unwrap();
        assert!(a.rental.car_number.starts_with("WALKIN-"));
        assert_ne!(a.rental.customer_id, b.rental.customer_id);
    }

    #[tokio::test]
    async fn test_oversell_rolls_back_everything() {
        let m = motel().await;
        let mut req = hourly_stay(&m.room, "51F-11111", at(10, 0));
        req.drinks = vec![DrinkOrder { drink_id: m.beer.id.clone(), quantity: 11 }];

        let err = m.db.rentals().create(&m.lan, req).await.unwrap_err();
        match err {
            DbError::Domain(CoreError::InsufficientStock { drink, available, requested }) => {
                assert_eq!(drink, "Tiger");
                assert_eq!((available, requested), (10, 11));
            }
            other => panic!("expected insufficient stock, got {:?}", other),
        }

        let beer = m.db.drinks().get(&m.beer.id).await.unwrap().unwrap();
        assert_eq!(beer.total_units(), 10);
        let room = m.db.rooms().get(&m.room.id).await.unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::Available);
        assert!(m.db.rentals().list_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_bill_and_change() {
        let m = motel().await;
        let rental = m
            .db
            .rentals()
            .create(&m.lan, hourly_stay(&m.room, "51F-11111", at(10, 0)))
            .await
            .unwrap();

        let done = m
            .db
            .rentals()
            .checkout(&m.lan, pay_cash(&rental.rental.id, 100_000, at(12, 5)))
            .await
            .unwrap();

        let r = &done.rental;
        assert_eq!(r.status, RentalStatus::Completed);
        assert_eq!(r.total_amount, Money::new(80_000));
        let payment = r.payment.as_ref().unwrap();
        assert_eq!(payment.change, Money::new(20_000));
        assert_eq!(r.payment_status, PaymentStatus::Completed);
        assert_eq!(r.check_out_time, Some(at(12, 5)));

        let room = m.db.rooms().get(&m.room.id).await.unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::Cleaning);

        let customer = m.db.customers().get(&r.customer_id).await.unwrap().unwrap();
        assert_eq!(customer.visit_count, 1);
        assert_eq!(customer.total_spent, Money::new(80_000));
    }

    #[tokio::test]
    async fn test_underpayment_then_settle() {
        let m = motel().await;
        m.db.shifts().start(&m.lan, None).await.unwrap();
        let rental = m
            .db
            .rentals()
            .create(&m.lan, hourly_stay(&m.room, "51F-11111", at(10, 0)))
            .await
            .unwrap();
        let id = rental.rental.id.clone();

        let done = m
            .db
            .rentals()
            .checkout(&m.lan, pay_cash(&id, 50_000, at(12, 5)))
            .await
            .unwrap();
        assert_eq!(done.rental.payment_status, PaymentStatus::Pending);
        assert_eq!(done.rental.payment.as_ref().unwrap().change, Money::zero());

        // still pending: the ledger row stays a check-in
        let rows = m.db.shifts().current_report(&m.lan).await.unwrap().transactions;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tx_type, TransactionType::Checkin);

        let paid = m
            .db
            .rentals()
            .settle_payment(&m.lan, &id, Money::new(40_000), PaymentMethod::Cash)
            .await
            .unwrap();
        assert_eq!(paid.rental.payment_status, PaymentStatus::Completed);
        assert_eq!(paid.rental.payment.as_ref().unwrap().change, Money::new(10_000));

        let rows = m.db.shifts().current_report(&m.lan).await.unwrap().transactions;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tx_type, TransactionType::Checkout);
        assert_eq!(rows[0].amount, Money::new(80_000));

        assert!(m
            .db
            .rentals()
            .settle_payment(&m.lan, &id, Money::new(1), PaymentMethod::Cash)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_checkout_before_check_in_rejected() {
        let m = motel().await;
        let rental = m
            .db
            .rentals()
            .create(&m.lan, hourly_stay(&m.room, "51F-11111", at(10, 0)))
            .await
            .unwrap();

        let err = m
            .db
            .rentals()
            .checkout(&m.lan, pay_cash(&rental.rental.id, 100_000, at(9, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::CheckoutBeforeCheckIn { .. })));

        let still = m.db.rentals().get(&rental.rental.id).await.unwrap();
        assert_eq!(still.rental.status, RentalStatus::Active);
    }

    #[tokio::test]
    async fn test_calculate_checkout_persists_nothing() {
        let m = motel().await;
        let mut req = hourly_stay(&m.room, "51F-11111", at(10, 0));
        req.drinks = vec![DrinkOrder { drink_id: m.beer.id.clone(), quantity: 2 }];
        let rental = m.db.rentals().create(&m.lan, req).await.unwrap();

        let preview = m
            .db
            .rentals()
            .calculate_checkout(CheckoutPreview {
                rental_id: rental.rental.id.clone(),
                checkout_time: Some(at(10, 45)),
                additional_charges: Money::new(5_000),
                discount: Money::new(10_000),
                customer_payment: Some(Money::new(200_000)),
                payment_method: None,
            })
            .await
            .unwrap();

        assert_eq!(preview.charge.amount, Money::new(70_000));
        assert_eq!(preview.charges.drinks, Money::new(50_000));
        assert_eq!(preview.charges.final_amount, Money::new(115_000));
        assert_eq!(preview.payment.unwrap().change, Money::new(85_000));

        let still = m.db.rentals().get(&rental.rental.id).await.unwrap();
        assert_eq!(still.rental.status, RentalStatus::Active);
        assert!(still.rental.charges.is_none());
    }

    #[tokio::test]
    async fn test_halfday_escalates_after_recorded_warning() {
        let m = motel().await;
        let mut req = hourly_stay(&m.room, "51F-11111", at(8, 0));
        req.rent_type = RentType::Halfday;
        let rental = m.db.rentals().create(&m.lan, req).await.unwrap();
        let id = rental.rental.id.clone();

        // 13h: past maxHalfDayHours
        let warning = m.db.rentals().flag_warning(&id, Some(at(21, 0))).await.unwrap();
        assert_eq!(warning.unwrap().suggested_type, RentType::Overnight);

        let done = m
            .db
            .rentals()
            .checkout(&m.lan, pay_cash(&id, 500_000, at(21, 0)))
            .await
            .unwrap();
        assert_eq!(done.rental.rent_type, RentType::Overnight);
        assert_eq!(done.rental.previous_rent_type, Some(RentType::Halfday));
        assert_eq!(done.rental.total_amount, Money::new(500_000));
    }

    #[tokio::test]
    async fn test_cancel_restores_room_and_stock() {
        let m = motel().await;
        m.db.shifts().start(&m.lan, None).await.unwrap();
        let mut req = hourly_stay(&m.room, "51F-11111", at(10, 0));
        req.drinks = vec![DrinkOrder { drink_id: m.beer.id.clone(), quantity: 4 }];
        let rental = m.db.rentals().create(&m.lan, req).await.unwrap();

        let cancelled = m.db.rentals().cancel(&rental.rental.id, Some("changed mind")).await.unwrap();
        assert_eq!(cancelled.rental.status, RentalStatus::Cancelled);

        let room = m.db.rooms().get(&m.room.id).await.unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::Available);
        let beer = m.db.drinks().get(&m.beer.id).await.unwrap().unwrap();
        assert_eq!(beer.total_units(), 10);

        let rows = m.db.shifts().current_report(&m.lan).await.unwrap().transactions;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, TransactionStatus::Completed);
        assert_eq!(rows[0].amount, Money::zero());
    }

    #[tokio::test]
    async fn test_drink_quantity_changes() {
        let m = motel().await;
        let rental = m
            .db
            .rentals()
            .create(&m.lan, hourly_stay(&m.room, "51F-11111", at(10, 0)))
            .await
            .unwrap();
        let id = rental.rental.id.clone();
        let beer = m.beer.id.clone();

        m.db.rentals()
            .add_drinks(&id, &[DrinkOrder { drink_id: beer.clone(), quantity: 3 }])
            .await
            .unwrap();
        let r = m.db.rentals().update_drink_quantity(&id, &beer, 2).await.unwrap();
        assert_eq!(r.drinks[0].quantity, 5);
        let r = m.db.rentals().update_drink_quantity(&id, &beer, -1).await.unwrap();
        assert_eq!(r.drinks[0].quantity, 4);
        assert_eq!(m.db.drinks().get(&beer).await.unwrap().unwrap().total_units(), 6);

        // over-increase fails and changes nothing
        assert!(m.db.rentals().update_drink_quantity(&id, &beer, 7).await.is_err());
        assert_eq!(m.db.drinks().get(&beer).await.unwrap().unwrap().total_units(), 6);

        let r = m.db.rentals().update_drink_quantity(&id, &beer, -4).await.unwrap();
        assert!(r.drinks.is_empty());
        assert_eq!(m.db.drinks().get(&beer).await.unwrap().unwrap().total_units(), 10);

        m.db.rentals()
            .add_drinks(&id, &[DrinkOrder { drink_id: beer.clone(), quantity: 2 }])
            .await
            .unwrap();
        let r = m.db.rentals().delete_drink(&id, &beer).await.unwrap();
        assert!(r.drinks.is_empty());
        assert_eq!(m.db.drinks().get(&beer).await.unwrap().unwrap().total_units(), 10);
    }

    #[tokio::test]
    async fn test_quantity_change_out_of_range() {
        let m = motel().await;
        let mut req = hourly_stay(&m.room, "51F-11111", at(10, 0));
        req.drinks = vec![DrinkOrder { drink_id: m.beer.id.clone(), quantity: 2 }];
        let rental = m.db.rentals().create(&m.lan, req).await.unwrap();
        let id = rental.rental.id.clone();

        for change in [i64::MAX, i64::MIN, MAX_QUANTITY + 1, -MAX_QUANTITY - 1] {
            let err = m
                .db
                .rentals()
                .update_drink_quantity(&id, &m.beer.id, change)
                .await
                .unwrap_err();
            assert!(
                matches!(err, DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))),
                "change {}: {:?}",
                change,
                err
            );
        }

        let details = m.db.rentals().get(&id).await.unwrap();
        assert_eq!(details.drinks[0].quantity, 2);
        assert_eq!(m.db.drinks().get(&m.beer.id).await.unwrap().unwrap().total_units(), 8);
    }

    #[tokio::test]
    async fn test_additional_cars() {
        let m = motel().await;
        let rental = m
            .db
            .rentals()
            .create(&m.lan, hourly_stay(&m.room, "51F-11111", at(10, 0)))
            .await
            .unwrap();
        let id = rental.rental.id.clone();

        let walk_in = || NewAdditionalCar { is_walk_in: true, ..NewAdditionalCar::default() };
        let plate = |p: &str| NewAdditionalCar {
            car_number: Some(p.to_string()),
            number_of_guests: Some(2),
            ..NewAdditionalCar::default()
        };

        m.db.rentals().add_additional_car(&id, walk_in()).await.unwrap();
        let err = m.db.rentals().add_additional_car(&id, walk_in()).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::WalkInCarExists)));

        let err = m.db.rentals().add_additional_car(&id, plate("51F-11111")).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::DuplicateCarOnRental { .. })));

        let r = m.db.rentals().add_additional_car(&id, plate("51F-22222")).await.unwrap();
        assert_eq!(r.additional_cars.len(), 2);

        // a car in this rental cannot check into another room
        let err = m
            .db
            .rentals()
            .create(&m.lan, hourly_stay(&m.other_room, "51F-22222", at(11, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::CustomerHasActiveRental { .. })));

        let walk_in_car = r.additional_cars.iter().find(|c| c.is_walk_in).unwrap();
        let r = m.db.rentals().remove_additional_car(&id, &walk_in_car.id).await.unwrap();
        assert!(r
            .additional_cars
            .iter()
            .any(|c| c.id == walk_in_car.id && c.status == CarStatus::Left));
        m.db.rentals().add_additional_car(&id, walk_in()).await.unwrap();
    }

    #[tokio::test]
    async fn test_checkout_records_relations_and_releases_cars() {
        let m = motel().await;
        let rental = m
            .db
            .rentals()
            .create(&m.lan, hourly_stay(&m.room, "51F-11111", at(10, 0)))
            .await
            .unwrap();
        let id = rental.rental.id.clone();
        m.db.rentals()
            .add_additional_car(
                &id,
                NewAdditionalCar {
                    car_number: Some("51F-22222".into()),
                    ..NewAdditionalCar::default()
                },
            )
            .await
            .unwrap();

        let done = m
            .db
            .rentals()
            .checkout(&m.lan, pay_cash(&id, 70_000, at(10, 30)))
            .await
            .unwrap();
        assert!(done.additional_cars.iter().all(|c| c.status == CarStatus::Left));

        let relations = m.db.customers().relations(&done.rental.customer_id).await.unwrap();
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].frequency, 1);

        // the second car is free again
        m.db.rentals()
            .create(&m.lan, hourly_stay(&m.other_room, "51F-22222", at(11, 0)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_checkout_without_shift_skips_ledger() {
        let m = motel().await;
        let rental = m
            .db
            .rentals()
            .create(&m.lan, hourly_stay(&m.room, "51F-11111", at(10, 0)))
            .await
            .unwrap();
        m.db.rentals()
            .checkout(&m.lan, pay_cash(&rental.rental.id, 70_000, at(10, 30)))
            .await
            .unwrap();

        let rows = ShiftRepository::new(m.db.pool().clone())
            .rental_transactions(&rental.rental.id)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
