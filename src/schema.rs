/// Column-name constants for the employee and sales tables.
/// Single source of truth - every module refers to columns through these.

// ── Employee columns ────────────────────────────────────────────────────────
pub mod employee {
    pub const EMPLOYEE_ID: &str = "employee_id";
    pub const NAME: &str = "name";
    pub const GENDER: &str = "gender";
    pub const NATIONALITY: &str = "nationality";
    pub const DEPARTMENT: &str = "department";
    pub const POSITION: &str = "position";
    pub const AGE: &str = "age";
    pub const BIRTHDATE: &str = "birthdate";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const ADDRESS: &str = "address";
    pub const HIRE_DATE: &str = "hire_date";
    pub const CONTRACT_TYPE: &str = "contract_type";
    pub const SALARY: &str = "salary";
    pub const TERMINATION_DATE: &str = "termination_date";

    pub const DATES: [&str; 3] = [BIRTHDATE, HIRE_DATE, TERMINATION_DATE];

    /// Source display name → canonical column name.
    pub const DISPLAY_NAMES: [(&str, &str); 15] = [
        ("Name", NAME),
        ("Gender", GENDER),
        ("Nationality", NATIONALITY),
        ("Department", DEPARTMENT),
        ("Position", POSITION),
        ("Age", AGE),
        ("Birthdate", BIRTHDATE),
        ("Email", EMAIL),
        ("Phone", PHONE),
        ("Address", ADDRESS),
        ("Hire Date", HIRE_DATE),
        ("Contract Type", CONTRACT_TYPE),
        ("Employee ID", EMPLOYEE_ID),
        ("Salary", SALARY),
        ("Termination Date", TERMINATION_DATE),
    ];
}

// ── Sale columns ────────────────────────────────────────────────────────────
pub mod sale {
    pub const SALE_ID: &str = "sale_id";
    pub const PRODUCT_ID: &str = "product_id";
    pub const SELLER_FIRST_NAME: &str = "seller_first_name";
    pub const SELLER_LAST_NAME: &str = "seller_last_name";
    pub const SELLER_EMPLOYEE_ID: &str = "seller_employee_id";
    pub const BUYER_NAME: &str = "buyer_name";
    pub const SALE_DATE: &str = "sale_date";
    pub const QUANTITY: &str = "quantity";
    pub const UNIT_PRICE: &str = "unit_price";
    pub const TOTAL_PRICE: &str = "total_price";
    pub const SALE_STATUS: &str = "sale_status";

    pub const PRICES: [&str; 2] = [UNIT_PRICE, TOTAL_PRICE];

    /// Source display name → canonical column name.
    pub const DISPLAY_NAMES: [(&str, &str); 11] = [
        ("Sale ID", SALE_ID),
        ("Product ID", PRODUCT_ID),
        ("Seller First Name", SELLER_FIRST_NAME),
        ("Seller Last Name", SELLER_LAST_NAME),
        ("Seller Employee ID", SELLER_EMPLOYEE_ID),
        ("Buyer Name", BUYER_NAME),
        ("Sale Date", SALE_DATE),
        ("Quantity", QUANTITY),
        ("Unit Price", UNIT_PRICE),
        ("Total Price", TOTAL_PRICE),
        ("Sale Status", SALE_STATUS),
    ];
}

// ── Validation rule columns ─────────────────────────────────────────────────
pub mod rules {
    pub const TERMINATION_AFTER_HIRE: &str = "termination_after_hire";
    pub const TERMINATION_AFTER_BIRTHDATE: &str = "termination_after_birthdate";

    pub const IS_PENDING: &str = "is_pending";
    pub const IS_COMPLETED: &str = "is_completed";
    pub const IS_CANCELLED: &str = "is_cancelled";
    pub const IS_FUTURE_DATE: &str = "is_future_date";
    pub const VALIDATE_PRICES: &str = "validate_prices";
    pub const VALIDATE_TOTAL_PRICE: &str = "validate_total_price";

    /// Every employee rule column, in matrix order.
    pub const EMPLOYEE_RULES: [&str; 2] = [TERMINATION_AFTER_HIRE, TERMINATION_AFTER_BIRTHDATE];
    /// Every sale rule column, in matrix order.
    pub const SALE_RULES: [&str; 6] = [
        IS_PENDING,
        IS_COMPLETED,
        IS_CANCELLED,
        IS_FUTURE_DATE,
        VALIDATE_PRICES,
        VALIDATE_TOTAL_PRICE,
    ];
    /// Sale rules that check data quality rather than describe the sale.
    pub const SALE_QUALITY_CHECKS: [&str; 2] = [VALIDATE_PRICES, VALIDATE_TOTAL_PRICE];
}

// ── Relation columns (derived) ──────────────────────────────────────────────
pub mod relation {
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const MATCHED: &str = "_matched";
}

// ── Internal helper columns ─────────────────────────────────────────────────
pub mod internal {
    pub const ROW_INDEX: &str = "_row";
    pub const SELLER_HIRE_DATE: &str = "_seller_hire_date";
}
