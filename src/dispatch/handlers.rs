//! Built-in restaurant intent handlers.
//!
//! Each handler is a pure function of its [`HandlerContext`]: the clock
//! hour is passed in rather than read, and missing entities fall back to
//! generic phrasing.

use crate::entity::RecognizedEntity;

/// Entity type carrying a customer name.
pub const NAME_ENTITY: &str = "Name";
/// Entity type carrying a dish or drink.
pub const FOOD_ENTITY: &str = "FoodItem";

/// Everything a handler may look at.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    pub utterance: &'a str,
    pub entities: &'a [RecognizedEntity],
    /// Local hour of day, 0-23.
    pub hour: u32,
}

impl HandlerContext<'_> {
    /// Value of the first entity of `entity_type`.
    pub fn first(&self, entity_type: &str) -> Option<&str> {
        self.entities
            .iter()
            .find(|e| e.entity_type == entity_type)
            .map(|e| e.entity_value.as_str())
    }

    pub fn name(&self) -> Option<&str> {
        self.first(NAME_ENTITY)
    }

    pub fn food(&self) -> Option<&str> {
        self.first(FOOD_ENTITY)
    }

    fn period(&self) -> DayPeriod {
        match self.hour {
            0..12 => DayPeriod::Morning,
            12..18 => DayPeriod::Afternoon,
            _ => DayPeriod::Evening,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
}

/// What a handler produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerReply {
    pub text: String,
    pub response_type: String,
    pub requires_follow_up: bool,
}

impl HandlerReply {
    fn new<S: Into<String>>(response_type: &str, text: S) -> Self {
        HandlerReply {
            text: text.into(),
            response_type: response_type.to_string(),
            requires_follow_up: false,
        }
    }

    fn follow_up(mut self) -> Self {
        self.requires_follow_up = true;
        self
    }
}

/// Handler signature.
pub type Handler = fn(&HandlerContext<'_>) -> HandlerReply;

/// `" {name}"` or nothing.
fn spaced(name: Option<&str>) -> String {
    name.map(|n| format!(" {n}")).unwrap_or_default()
}

/// `" for {name}"` or nothing.
fn for_name(name: Option<&str>) -> String {
    name.map(|n| format!(" for {n}")).unwrap_or_default()
}

pub fn greeting(ctx: &HandlerContext<'_>) -> HandlerReply {
    let period = match ctx.period() {
        DayPeriod::Morning => "Good morning",
        DayPeriod::Afternoon => "Good afternoon",
        DayPeriod::Evening => "Good evening",
    };
    HandlerReply::new(
        "Greeting",
        format!("{period}{}, how can I help you?", spaced(ctx.name())),
    )
}

pub fn goodbye(ctx: &HandlerContext<'_>) -> HandlerReply {
    let farewell = match ctx.period() {
        DayPeriod::Morning => "Have a great morning",
        DayPeriod::Afternoon => "Have a great afternoon",
        DayPeriod::Evening => "Good night",
    };
    HandlerReply::new("Goodbye", format!("{farewell}{}", spaced(ctx.name())))
}

pub fn compliment(ctx: &HandlerContext<'_>) -> HandlerReply {
    HandlerReply::new(
        "Compliment",
        format!("Thank you, that was nice of you{}", spaced(ctx.name())),
    )
}

pub fn criticism(ctx: &HandlerContext<'_>) -> HandlerReply {
    let text = match ctx.name() {
        Some(name) => format!("I am sorry you feel that way, {name}!"),
        None => "I am sorry you feel that way!".to_string(),
    };
    HandlerReply::new("Criticism", text)
}

pub fn menu(ctx: &HandlerContext<'_>) -> HandlerReply {
    let text = match ctx.food() {
        Some(food) => format!("Yes, we do have {food}"),
        None => "Getting you the menu of what food we have".to_string(),
    };
    HandlerReply::new("Menu", text)
}

fn search(ctx: &HandlerContext<'_>, response_type: &str, category: &str) -> HandlerReply {
    let text = match ctx.food() {
        Some(food) => format!("Getting {food}{}", for_name(ctx.name())),
        None => format!("Getting all {category} available"),
    };
    HandlerReply::new(response_type, text)
}

pub fn search_dosa(ctx: &HandlerContext<'_>) -> HandlerReply {
    search(ctx, "SearchDosa", "dosas")
}

pub fn search_idly(ctx: &HandlerContext<'_>) -> HandlerReply {
    search(ctx, "SearchIdly", "idlies")
}

pub fn search_nonveg_appetizer(ctx: &HandlerContext<'_>) -> HandlerReply {
    search(ctx, "SearchNonvegAppetizer", "non-veg appetizers")
}

pub fn search_veg_appetizer(ctx: &HandlerContext<'_>) -> HandlerReply {
    search(ctx, "SearchVegAppetizer", "veg appetizers")
}

pub fn search_beverage(ctx: &HandlerContext<'_>) -> HandlerReply {
    search(ctx, "SearchBeverage", "beverages")
}

pub fn order(ctx: &HandlerContext<'_>) -> HandlerReply {
    match ctx.food() {
        Some(food) => HandlerReply::new(
            "Order",
            format!("Ordering {food}{}. Confirm?", for_name(ctx.name())),
        )
        .follow_up(),
        None => HandlerReply::new("Order", "Please specify what to order."),
    }
}

pub fn support(ctx: &HandlerContext<'_>) -> HandlerReply {
    HandlerReply::new(
        "Support",
        format!("Support information{}", for_name(ctx.name())),
    )
}

/// The restaurant handlers keyed by the intent label they serve.
pub fn builtin_handlers() -> Vec<(&'static str, Handler)> {
    let handlers: [(&'static str, Handler); 12] = [
        ("Greeting", greeting),
        ("Goodbye", goodbye),
        ("Compliment", compliment),
        ("Criticism", criticism),
        ("Menu", menu),
        ("SearchDosa", search_dosa),
        ("SearchIdly", search_idly),
        ("SearchNonvegAppetizer", search_nonveg_appetizer),
        ("SearchVegAppetizer", search_veg_appetizer),
        ("SearchBeverage", search_beverage),
        ("Order", order),
        ("Support", support),
    ];
    handlers.to_vec()
}
