pub mod user;
pub mod category;
pub mod transaction;
pub mod budget;
pub mod saving_goals;
pub mod filter;


pub use user::User;
pub use category::{Category, CategoryType, NewCategory};
pub use transaction::{NewTransaction, Transaction};
pub use budget::{Budget, BudgetItem, NewBudget, NewBudgetItem};
pub use saving_goals::{NewSavingsGoal, SavingsGoal, SavingsGoalChanges};
pub use filter::{BudgetFilter, CategoryFilter, TransactionFilter, TransactionKind};
