pub mod order_note;
pub mod product;
pub mod production_order;
pub mod stock_move;
pub mod stock_move_dest;
pub mod system_parameter;
pub mod work_order;
