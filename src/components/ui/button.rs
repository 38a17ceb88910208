use leptos::prelude::*;
use leptos_ui::variants;

variants! {
    Button {
        base: "inline-flex items-center justify-center gap-2 whitespace-nowrap rounded-md text-sm font-medium transition-all disabled:pointer-events-none disabled:opacity-50 [&_svg]:pointer-events-none [&_svg:not([class*='size-'])]:size-4 shrink-0 outline-none focus-visible:ring-ring/50 focus-visible:ring-[3px] hover:cursor-pointer select-none",
        variants: {
            variant: {
                Default: "bg-primary text-primary-foreground shadow-xs hover:bg-primary/90",
                Outline: "border bg-background shadow-xs hover:bg-accent hover:text-accent-foreground",
                Ghost: "hover:bg-accent hover:text-accent-foreground",
            },
            size: {
                Default: "h-9 px-4 py-2",
                Sm: "h-8 gap-1.5 px-3",
                Icon: "size-6",
            }
        },
        component: {
            element: button
        }
    }
}
