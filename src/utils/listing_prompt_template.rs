pub static LISTING_PROMPT_TEMPLATE: &str = r#"Task: Rewrite an Airbnb listing description to attract guests attending an event.

Strict rules:
- Keep ONLY facts stated in the original description. Do NOT invent amenities, rules, views, parking, neighborhood claims, or anything else.
- 30-70 words, one paragraph.
- Friendly, natural tone (no cringe marketing).
- Mention the event and convenience to the venue using the provided event info.

Event info:
- Name: {event_name}
- Type: {event_type}
- Date: {event_date}
- Venue: {venue_name}
- Distance to venue (km): {distance_km}
- Days until event: {days_until}

Pricing context (do not claim discounts or guarantees):
- Current price: {current_price}
- Suggested price: {suggested_price}

Original description:
{description}

Output ONLY the improved description text:"#;
