//! # Services
//!
//! Multi-entity operations, each one database transaction.
//!
//! ```text
//! RentalService::checkout
//!   │  pool.begin()
//!   ├── RentalRepository::require          read rental
//!   ├── calculate_charge (innkeep-core)    price the stay
//!   ├── RentalRepository::save             completed + charges + payment
//!   ├── RoomRepository::transition         occupied → cleaning
//!   ├── CustomerRepository::record_visit   visit stats, relations
//!   ├── shift::record_checkout             ledger row(s)
//!   │  tx.commit()
//!   └── RentalRepository::details          read back for the response
//! ```
//!
//! Any `?` before `commit` drops the transaction and rolls everything back.

pub mod rental;
pub mod shift;

pub use rental::{
    CheckoutBreakdown, CheckoutPreview, CheckoutRequest, CreateRental, CustomerRef,
    NewAdditionalCar, RentalService,
};
pub use shift::{
    close_checkin, record_checkin, record_checkout, CheckoutEvent, ShiftService, ShiftSummary,
};

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::repository::{NewDrink, RoomTypeRepository};
    use crate::{Database, DbConfig};
    use innkeep_core::pricing::RoomPrice;
    use innkeep_core::{Drink, Money, RentType, Room, User, UserRole};

    use super::{CheckoutRequest, CreateRental, CustomerRef};

    /// A small motel: one room type priced 300000 / 500000, two rooms, two
    /// staff members and one drink.
    pub struct Motel {
        pub db: Database,
        pub lan: User,
        pub minh: User,
        pub room: Room,
        pub other_room: Room,
        pub beer: Drink,
    }

    pub async fn motel() -> Motel {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let lan = db.users().create("lan", "Lan Nguyen", UserRole::Staff).await.unwrap();
        let minh = db.users().create("minh", "Minh Tran", UserRole::Staff).await.unwrap();

        let room_type = RoomTypeRepository::new(db.pool().clone())
            .create("Standard")
            .await
            .unwrap();
        let room = db.rooms().create("101", 1, &room_type.id).await.unwrap();
        let other_room = db.rooms().create("102", 1, &room_type.id).await.unwrap();

        let mut logic = db.price_logic().get().await.unwrap();
        logic.room_prices.insert(
            room_type.id.clone(),
            RoomPrice {
                half_day_price: Money::new(300_000),
                full_day_price: Money::new(500_000),
            },
        );
        db.price_logic().update(logic).await.unwrap();

        let beer = db
            .drinks()
            .create(NewDrink {
                name: "Tiger".to_string(),
                cost_price: Money::new(15_000),
                selling_price: Money::new(25_000),
                units_per_pack: 24,
                pack_stock: 0,
                unit_stock: 10,
                alert_threshold: 2,
            })
            .await
            .unwrap();

        Motel {
            db,
            lan,
            minh,
            room,
            other_room,
            beer,
        }
    }

    pub fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    pub fn guest(car_number: &str) -> CustomerRef {
        CustomerRef {
            is_walk_in: false,
            car_number: Some(car_number.to_string()),
            customer_id: None,
            full_name: None,
            phone: None,
        }
    }

    pub fn hourly_stay(room: &Room, car_number: &str, check_in: NaiveDateTime) -> CreateRental {
        CreateRental {
            room_id: room.id.clone(),
            rent_type: RentType::Hourly,
            check_in_time: Some(check_in),
            number_of_guests: 2,
            main_customer: guest(car_number),
            drinks: Vec::new(),
            note: None,
        }
    }

    pub fn pay_cash(rental_id: &str, customer_payment: i64, checkout: NaiveDateTime) -> CheckoutRequest {
        CheckoutRequest {
            rental_id: rental_id.to_string(),
            additional_charges: Money::zero(),
            discount: Money::zero(),
            note: None,
            payment_method: innkeep_core::PaymentMethod::Cash,
            customer_payment: Money::new(customer_payment),
            checkout_time: Some(checkout),
        }
    }
}
