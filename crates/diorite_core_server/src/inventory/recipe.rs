use std::sync::Arc;

use diorite_mc_constants::item::Material;
use parking_lot::Mutex;
use tracing::trace;

use super::{item_stack::ItemStack, slot_array::SlotArray};

/// Outcome of matching a crafting grid against the known recipes.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeCheckResult {
    pub recipe: usize,
    pub result: ItemStack,
}

pub trait RecipeManager: Send + Sync {
    fn match_recipe(&self, grid: &CraftingGrid) -> Option<RecipeCheckResult>;
}

/// A crafting matrix plus its result slot, laid out as `[result, matrix..]`
/// inside an inventory's slots.
#[derive(Debug)]
pub struct CraftingGrid {
    result: SlotArray,
    matrix: SlotArray,
    width: usize,
    base_index: usize,
    last_match: Mutex<Option<usize>>,
}

impl CraftingGrid {
    /// `slots` must start with the result slot followed by `width * width`
    /// matrix slots. `base_index` is the position of the result slot in the
    /// owning inventory.
    pub(crate) fn new(slots: &SlotArray, width: usize, base_index: usize) -> Self {
        Self {
            result: slots.get_sub_array(0, 1),
            matrix: slots.get_sub_array(1, width * width),
            width,
            base_index,
            last_match: Mutex::new(None),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn matrix(&self) -> &SlotArray {
        &self.matrix
    }

    pub fn result(&self) -> Option<Arc<ItemStack>> {
        self.result.get(0)
    }

    /// Materials currently in the matrix, skipping empty slots.
    pub fn ingredients(&self) -> Vec<Material> {
        self.matrix.iter()
            .flatten()
            .filter(|item| !item.is_empty())
            .map(|item| item.material())
            .collect()
    }

    pub fn last_match(&self) -> Option<usize> {
        *self.last_match.lock()
    }

    /// Whether any matrix slot changed since viewers last saw it. `known`
    /// is indexed like the owning inventory.
    pub(crate) fn matrix_changed(&self, known: &[bool]) -> bool {
        (0..self.matrix.len()).any(|index| {
            let was_known = known[self.base_index + 1 + index];
            match self.matrix.get(index) {
                Some(item) => item.is_dirty() || item.is_empty(),
                None => was_known,
            }
        })
    }

    /// Matches the matrix and updates the result slot to the outcome,
    /// clearing it when nothing matches.
    pub fn check_recipe(&self, recipes: &dyn RecipeManager) -> Option<RecipeCheckResult> {
        let matched = recipes.match_recipe(self);
        let expected = matched.as_ref().map(|matched| &matched.result);

        let current = self.result.get(0);
        let differs = match (current.as_deref(), expected) {
            (None, None) => false,
            (Some(current), None) => !current.is_empty(),
            (None, Some(_)) => true,
            (Some(current), Some(expected)) => current != expected,
        };
        if differs {
            trace!(recipe = ?matched.as_ref().map(|matched| matched.recipe), "crafting result changed");
            self.result.set(0, expected.map(|result| Arc::new(result.clone())));
        }

        *self.last_match.lock() = matched.as_ref().map(|matched| matched.recipe);
        matched
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapelessRecipe {
    pub ingredients: Vec<Material>,
    pub result: Material,
    pub amount: u8,
}

impl ShapelessRecipe {
    pub fn new(ingredients: &[Material], result: Material, amount: u8) -> Self {
        let mut ingredients = ingredients.to_vec();
        ingredients.sort_by_key(|material| material.id());
        Self {
            ingredients,
            result,
            amount,
        }
    }

    fn matches(&self, sorted_ingredients: &[Material]) -> bool {
        self.ingredients == sorted_ingredients
    }
}

/// Recipe list matched in registration order; the first recipe whose
/// ingredients equal the grid's contents wins.
#[derive(Debug, Clone)]
pub struct SimpleRecipeManager {
    recipes: Vec<ShapelessRecipe>,
}

impl SimpleRecipeManager {
    pub fn empty() -> Self {
        Self {
            recipes: Vec::new(),
        }
    }

    pub fn register(&mut self, recipe: ShapelessRecipe) -> usize {
        self.recipes.push(recipe);
        self.recipes.len() - 1
    }

    pub fn recipes(&self) -> &[ShapelessRecipe] {
        &self.recipes
    }
}

impl Default for SimpleRecipeManager {
    fn default() -> Self {
        let mut manager = Self::empty();
        manager.register(ShapelessRecipe::new(&[Material::Log], Material::Planks, 4));
        manager.register(ShapelessRecipe::new(&[Material::Planks, Material::Planks], Material::Stick, 4));
        manager.register(ShapelessRecipe::new(&[Material::Planks; 4], Material::CraftingTable, 1));
        manager.register(ShapelessRecipe::new(&[Material::Stick, Material::Planks], Material::Torch, 4));
        manager
    }
}

impl RecipeManager for SimpleRecipeManager {
    fn match_recipe(&self, grid: &CraftingGrid) -> Option<RecipeCheckResult> {
        let mut ingredients = grid.ingredients();
        if ingredients.is_empty() {
            return None;
        }
        ingredients.sort_by_key(|material| material.id());

        self.recipes.iter()
            .position(|recipe| recipe.matches(&ingredients))
            .map(|index| {
                let recipe = &self.recipes[index];
                RecipeCheckResult {
                    recipe: index,
                    result: ItemStack::new(recipe.result, recipe.amount),
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> (SlotArray, CraftingGrid) {
        let slots = SlotArray::new(5);
        let grid = CraftingGrid::new(&slots, 2, 0);
        (slots, grid)
    }

    #[test]
    fn log_makes_planks() {
        let (slots, grid) = grid();
        slots.set(3, Some(Arc::new(ItemStack::single(Material::Log))));

        let matched = grid.check_recipe(&SimpleRecipeManager::default()).unwrap();
        assert_eq!(matched.result, ItemStack::new(Material::Planks, 4));
        assert_eq!(*grid.result().unwrap(), ItemStack::new(Material::Planks, 4));
        assert_eq!(grid.last_match(), Some(0));
    }

    #[test]
    fn ingredient_order_does_not_matter() {
        let (slots, grid) = grid();
        slots.set(1, Some(Arc::new(ItemStack::single(Material::Planks))));
        slots.set(4, Some(Arc::new(ItemStack::single(Material::Stick))));

        let matched = grid.check_recipe(&SimpleRecipeManager::default()).unwrap();
        assert_eq!(matched.result.material(), Material::Torch);
    }

    #[test]
    fn no_match_clears_result() {
        let (slots, grid) = grid();
        slots.set(0, Some(Arc::new(ItemStack::new(Material::Planks, 4))));
        slots.set(1, Some(Arc::new(ItemStack::single(Material::Apple))));

        assert!(grid.check_recipe(&SimpleRecipeManager::default()).is_none());
        assert!(grid.result().is_none());
        assert_eq!(grid.last_match(), None);
    }

    #[test]
    fn unchanged_result_is_not_replaced() {
        let (slots, grid) = grid();
        slots.set(2, Some(Arc::new(ItemStack::single(Material::Log))));
        let recipes = SimpleRecipeManager::default();

        grid.check_recipe(&recipes);
        let first = grid.result().unwrap();
        grid.check_recipe(&recipes);
        assert!(Arc::ptr_eq(&first, &grid.result().unwrap()));
    }

    #[test]
    fn matrix_changes_are_detected() {
        let (slots, grid) = grid();
        let known = vec![false; 5];
        assert!(!grid.matrix_changed(&known));

        let log = Arc::new(ItemStack::single(Material::Log));
        slots.set(1, Some(log.clone()));
        assert!(grid.matrix_changed(&known));

        log.set_clean();
        assert!(!grid.matrix_changed(&known));

        slots.set(1, None);
        assert!(grid.matrix_changed(&[false, true, false, false, false]));
    }
}
