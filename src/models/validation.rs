use rust_decimal::Decimal;

use super::{
    CreateOrderRequest, DishRequest, UpdateOrderRequest, ValidationError, ValidationResult,
};

/// Trait for validating input models
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

/// Validation constants
pub const MAX_DISH_NAME_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;
pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;
pub const MIN_PRICE: Decimal = Decimal::ZERO;
pub const MAX_PRICE: Decimal = Decimal::from_parts(999_999_999, 0, 0, false, 2); // 9999999.99
pub const MAX_AVAILABLE_QUANTITY: i32 = 1_000_000;
pub const MAX_ORDER_QUANTITY: i32 = 1000;
pub const MIN_ORDER_QUANTITY: i32 = 1;

impl Validate for DishRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_dish_name(&self.name)?;
        validate_dish_description(&self.description)?;
        validate_dish_price(&self.price)?;
        validate_identifier("category_id", self.category_id)?;
        validate_available_quantity(self.available_quantity)?;
        if let Some(category) = &self.category {
            validate_category_name(&category.name)?;
        }
        Ok(())
    }
}

impl Validate for CreateOrderRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_identifier("menu_id", self.menu_id)?;
        validate_order_quantity(self.quantity)?;
        Ok(())
    }
}

impl Validate for UpdateOrderRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_identifier("menu_id", self.menu_id)?;
        validate_order_quantity(self.quantity)?;
        Ok(())
    }
}

/// Validate dish name
pub fn validate_dish_name(name: &str) -> ValidationResult<()> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "name".to_string(),
        });
    }

    if trimmed.chars().count() > MAX_DISH_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max_length: MAX_DISH_NAME_LENGTH,
            actual_length: trimmed.chars().count(),
        });
    }

    if trimmed
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(ValidationError::InvalidValue {
            field: "name".to_string(),
            value: name.to_string(),
            reason: "Contains invalid control characters".to_string(),
        });
    }

    Ok(())
}

/// Validate dish description. An empty description is allowed.
pub fn validate_dish_description(description: &str) -> ValidationResult<()> {
    let length = description.chars().count();
    if length > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max_length: MAX_DESCRIPTION_LENGTH,
            actual_length: length,
        });
    }

    Ok(())
}

/// Validate dish price
pub fn validate_dish_price(price: &Decimal) -> ValidationResult<()> {
    if *price < MIN_PRICE || *price > MAX_PRICE {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: MIN_PRICE.to_string(),
            max: MAX_PRICE.to_string(),
            value: price.to_string(),
        });
    }

    // NUMERIC(12,2) column
    if price.scale() > 2 && price.normalize().scale() > 2 {
        return Err(ValidationError::InvalidValue {
            field: "price".to_string(),
            value: price.to_string(),
            reason: "Price cannot have more than 2 decimal places".to_string(),
        });
    }

    Ok(())
}

pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    let length = name.trim().chars().count();
    if length > MAX_CATEGORY_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "category.name".to_string(),
            max_length: MAX_CATEGORY_NAME_LENGTH,
            actual_length: length,
        });
    }

    Ok(())
}

/// Validate available stock of a dish
pub fn validate_available_quantity(quantity: i32) -> ValidationResult<()> {
    if !(0..=MAX_AVAILABLE_QUANTITY).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: "available_quantity".to_string(),
            min: "0".to_string(),
            max: MAX_AVAILABLE_QUANTITY.to_string(),
            value: quantity.to_string(),
        });
    }

    Ok(())
}

/// Validate quantity of an order line
pub fn validate_order_quantity(quantity: i32) -> ValidationResult<()> {
    if !(MIN_ORDER_QUANTITY..=MAX_ORDER_QUANTITY).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: MIN_ORDER_QUANTITY.to_string(),
            max: MAX_ORDER_QUANTITY.to_string(),
            value: quantity.to_string(),
        });
    }

    Ok(())
}

/// Identifiers referencing other records must be positive
pub fn validate_identifier(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "1".to_string(),
            max: i64::MAX.to_string(),
            value: id.to_string(),
        });
    }

    Ok(())
}
